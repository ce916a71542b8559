use crate::catalog::model::{Item, ItemStatus};
use crate::error::{MarketError, MarketResult, StatusParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// 제안 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(StatusParseError {
                kind: "offer",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for OfferStatus {
    type Error = StatusParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// 제안 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Offer {
    pub id: Uuid,
    pub giver_id: Uuid,
    pub seller_id: Option<Uuid>,
    pub item_name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub expected_price: i64,
    pub agreed_price: Option<i64>,
    pub condition: String,
    pub location: String,
    #[sqlx(try_from = "String")]
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// 특정 판매자에게 보낸 제안인지 확인 (공개 제안은 누구나 처리 가능)
    pub fn check_addressed_to(&self, seller_id: Uuid) -> MarketResult<()> {
        match self.seller_id {
            Some(target) if target != seller_id => Err(MarketError::NotSellerOrOwner),
            _ => Ok(()),
        }
    }

    /// 대기 상태에서만 수락/거절 가능
    pub fn ensure_pending(&self) -> MarketResult<()> {
        if self.status == OfferStatus::Pending {
            Ok(())
        } else {
            Err(MarketError::StateConflict(format!(
                "이미 처리된 제안입니다 (상태: {})",
                self.status
            )))
        }
    }

    /// 수락된 제안으로부터 초안 상품 생성
    pub fn draft_item(&self, shop_id: Uuid) -> MarketResult<Item> {
        let price = self.agreed_price.ok_or_else(|| {
            MarketError::StateConflict("합의 가격이 없는 제안입니다.".to_string())
        })?;

        let mut description = self.description.trim().to_string();
        if !description.is_empty() {
            description.push_str("\n\n");
        }
        description.push_str(&format!(
            "상태: {}\n위치: {}",
            self.condition,
            self.location.trim()
        ));

        let now = Utc::now();
        Ok(Item {
            id: Uuid::new_v4(),
            shop_id,
            category_id: None,
            name: self.item_name.clone(),
            description,
            price,
            stock: 1,
            condition: self.condition.clone(),
            status: ItemStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }
}

// region:    --- Inputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOfferInput {
    /// 빈 문자열 또는 생략 = 공개 제안
    #[serde(default)]
    pub seller_id: Option<String>,
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    pub expected_price: i64,
    pub condition: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateOfferInput {
    /// 입력 검증 후 저장할 제안 생성
    pub fn into_offer(self, giver_id: Uuid) -> MarketResult<Offer> {
        let seller_id = parse_seller_ref(self.seller_id.as_deref())?;
        if self.expected_price < 0 {
            return Err(MarketError::Validation(
                "희망 가격은 0 이상이어야 합니다.".to_string(),
            ));
        }
        let item_name = self.item_name.trim();
        if item_name.is_empty() {
            return Err(MarketError::Validation("상품명은 필수입니다.".to_string()));
        }
        let condition = self.condition.trim();
        if condition.is_empty() {
            return Err(MarketError::Validation(
                "상품 상태는 필수입니다.".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Offer {
            id: Uuid::new_v4(),
            giver_id,
            seller_id,
            item_name: item_name.to_string(),
            description: self.description.trim().to_string(),
            image_url: self
                .image_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            expected_price: self.expected_price,
            agreed_price: None,
            condition: condition.to_string(),
            location: self.location.trim().to_string(),
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptOfferInput {
    pub agreed_price: i64,
}

/// 판매자 참조 파싱 (빈 문자열 = 없음)
pub fn parse_seller_ref(raw: Option<&str>) -> MarketResult<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<Uuid>()
            .map(Some)
            .map_err(|_| MarketError::Validation(format!("잘못된 판매자 ID: {}", value))),
    }
}
// endregion: --- Inputs

/// 수락 결과
/// 제안 수락은 커밋된 뒤이므로 초안 상품 생성 실패는 draft_error로만 전달된다.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptOutcome {
    pub offer: Offer,
    pub draft_item: Option<Item>,
    pub draft_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateOfferInput {
        CreateOfferInput {
            seller_id: None,
            item_name: " 원목 의자 ".to_string(),
            description: "거의 새것".to_string(),
            expected_price: 20_000,
            condition: "like_new".to_string(),
            location: "성수동".to_string(),
            image_url: Some("  ".to_string()),
        }
    }

    fn pending_offer(seller_id: Option<Uuid>) -> Offer {
        input()
            .into_offer(Uuid::new_v4())
            .map(|offer| Offer { seller_id, ..offer })
            .unwrap()
    }

    #[test]
    fn parses_seller_reference() {
        let id = Uuid::new_v4();
        assert_eq!(parse_seller_ref(None).unwrap(), None);
        assert_eq!(parse_seller_ref(Some("")).unwrap(), None);
        assert_eq!(parse_seller_ref(Some(" ")).unwrap(), None);
        assert_eq!(parse_seller_ref(Some(&id.to_string())).unwrap(), Some(id));
        assert!(matches!(
            parse_seller_ref(Some("seller-1")),
            Err(MarketError::Validation(_))
        ));
    }

    #[test]
    fn builds_pending_offer_from_input() {
        let giver_id = Uuid::new_v4();
        let offer = input().into_offer(giver_id).unwrap();
        assert_eq!(offer.giver_id, giver_id);
        assert_eq!(offer.item_name, "원목 의자");
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.agreed_price, None);
        assert_eq!(offer.image_url, None);
    }

    #[test]
    fn rejects_invalid_offer_input() {
        let negative = CreateOfferInput {
            expected_price: -1,
            ..input()
        };
        assert!(matches!(
            negative.into_offer(Uuid::new_v4()),
            Err(MarketError::Validation(_))
        ));

        let unnamed = CreateOfferInput {
            item_name: "  ".to_string(),
            ..input()
        };
        assert!(unnamed.into_offer(Uuid::new_v4()).is_err());

        let no_condition = CreateOfferInput {
            condition: String::new(),
            ..input()
        };
        assert!(no_condition.into_offer(Uuid::new_v4()).is_err());
    }

    #[test]
    fn only_target_seller_may_handle_addressed_offer() {
        let seller_a = Uuid::new_v4();
        let seller_b = Uuid::new_v4();
        let addressed = pending_offer(Some(seller_a));
        assert!(addressed.check_addressed_to(seller_a).is_ok());
        assert!(matches!(
            addressed.check_addressed_to(seller_b),
            Err(MarketError::NotSellerOrOwner)
        ));

        let open = pending_offer(None);
        assert!(open.check_addressed_to(seller_b).is_ok());
    }

    #[test]
    fn settled_offers_cannot_transition() {
        let mut offer = pending_offer(None);
        assert!(offer.ensure_pending().is_ok());
        offer.status = OfferStatus::Accepted;
        assert!(matches!(
            offer.ensure_pending(),
            Err(MarketError::StateConflict(_))
        ));
        offer.status = OfferStatus::Rejected;
        assert!(offer.ensure_pending().is_err());
    }

    #[test]
    fn draft_item_copies_offer_fields() {
        let shop_id = Uuid::new_v4();
        let mut offer = pending_offer(None);
        offer.status = OfferStatus::Accepted;
        offer.agreed_price = Some(15_000);

        let item = offer.draft_item(shop_id).unwrap();
        assert_eq!(item.shop_id, shop_id);
        assert_eq!(item.name, offer.item_name);
        assert_eq!(item.condition, offer.condition);
        assert_eq!(item.price, 15_000);
        assert_eq!(item.stock, 1);
        assert_eq!(item.category_id, None);
        assert_eq!(item.status, ItemStatus::Draft);
        assert!(item.description.starts_with("거의 새것"));
        assert!(item.description.contains("like_new"));
        assert!(item.description.contains("성수동"));
    }

    #[test]
    fn draft_item_requires_agreed_price() {
        let offer = pending_offer(None);
        assert!(offer.draft_item(Uuid::new_v4()).is_err());
    }
}
