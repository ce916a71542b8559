use crate::error::StatusParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 이력 대상 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedType {
    Order,
    Offer,
}

impl RelatedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Offer => "offer",
        }
    }
}

impl fmt::Display for RelatedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelatedType {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(Self::Order),
            "offer" => Ok(Self::Offer),
            other => Err(StatusParseError {
                kind: "related_type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RelatedType {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 알림 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Offer,
    NewOrder,
    OrderStatus,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::NewOrder => "new_order",
            Self::OrderStatus => "order_status",
        }
    }
}

impl FromStr for NotificationType {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offer" => Ok(Self::Offer),
            "new_order" => Ok(Self::NewOrder),
            "order_status" => Ok(Self::OrderStatus),
            other => Err(StatusParseError {
                kind: "notification_type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for NotificationType {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// 상태 변경 이력
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryStatus {
    pub id: Uuid,
    pub related_id: Uuid,
    #[sqlx(try_from = "String")]
    pub related_type: RelatedType,
    pub old_status: String,
    pub new_status: String,
    pub changed_by: Uuid,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

// 알림
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub related_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// 메시지 브로커로 전달되는 기록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogRecord {
    HistoryStatus(HistoryStatus),
    Notification(Notification),
}

impl LogRecord {
    /// 파티션 키 (같은 대상의 기록은 순서 보장)
    pub fn key(&self) -> Uuid {
        match self {
            Self::HistoryStatus(h) => h.related_id,
            Self::Notification(n) => n.related_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_serializes_type_field() {
        let noti = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "새 주문".to_string(),
            message: "주문이 들어왔습니다.".to_string(),
            kind: NotificationType::NewOrder,
            related_id: Uuid::new_v4(),
            is_read: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&noti).unwrap();
        assert_eq!(value["type"], "new_order");
        assert_eq!(value["is_read"], false);
    }

    #[test]
    fn log_record_key_follows_related_entity() {
        let related_id = Uuid::new_v4();
        let record = LogRecord::HistoryStatus(HistoryStatus {
            id: Uuid::new_v4(),
            related_id,
            related_type: RelatedType::Offer,
            old_status: "pending".to_string(),
            new_status: "accepted".to_string(),
            changed_by: Uuid::new_v4(),
            timestamp: Utc::now(),
            note: None,
        });
        assert_eq!(record.key(), related_id);

        let decoded: LogRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(decoded.key(), related_id);
    }
}
