/// 부수 효과 기록 (상태 변경 이력, 알림)
/// 주 트랜잭션 커밋 이후에만 호출되며, 실패해도 호출자에게 전파하지 않는다.
// region:    --- Imports
use crate::error::{MarketError, MarketResult};
use crate::message_broker::{BoxError, KafkaConsumer, KafkaProducer};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

pub mod queries;
pub mod records;

pub use records::{HistoryStatus, LogRecord, Notification, NotificationType, RelatedType};

// endregion: --- Imports

// region:    --- Log Sink Trait
/// 추가 전용 로그 저장소 트레이트
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn save_history_status(&self, doc: HistoryStatus) -> MarketResult<()>;
    async fn save_notification(&self, doc: Notification) -> MarketResult<()>;
}
// endregion: --- Log Sink Trait

// region:    --- Side Effects
/// 엔진에서 사용하는 부수 효과 발행기
#[derive(Clone)]
pub struct SideEffects {
    sink: Arc<dyn LogSink>,
    timeout: Duration,
}

impl SideEffects {
    pub fn new(sink: Arc<dyn LogSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// 상태 변경 이력 기록
    pub async fn record_status_change(
        &self,
        related_id: Uuid,
        related_type: RelatedType,
        old_status: &str,
        new_status: &str,
        changed_by: Uuid,
        note: Option<String>,
    ) {
        let doc = HistoryStatus {
            id: Uuid::new_v4(),
            related_id,
            related_type,
            old_status: old_status.to_string(),
            new_status: new_status.to_string(),
            changed_by,
            timestamp: Utc::now(),
            note,
        };
        self.best_effort("이력", related_id, self.sink.save_history_status(doc))
            .await;
    }

    /// 알림 기록
    pub async fn record_notification(
        &self,
        user_id: Uuid,
        title: &str,
        message: String,
        kind: NotificationType,
        related_id: Uuid,
    ) {
        let doc = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            message,
            kind,
            related_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.best_effort("알림", user_id, self.sink.save_notification(doc))
            .await;
    }

    async fn best_effort<F>(&self, what: &str, target: Uuid, fut: F)
    where
        F: Future<Output = MarketResult<()>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                "{:<12} --> {} 저장 실패 (대상 {}): {}",
                "LogSink", what, target, e
            ),
            Err(_) => warn!(
                "{:<12} --> {} 저장 시간 초과 (대상 {})",
                "LogSink", what, target
            ),
        }
    }
}
// endregion: --- Side Effects

// region:    --- Postgres Log Sink
/// 문서형 테이블(history_status, notifications)에 저장하는 구현체
pub struct PostgresLogSink {
    pool: Arc<PgPool>,
}

impl PostgresLogSink {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 로그 테이블 생성
    pub async fn initialize(&self) -> Result<(), sqlx::Error> {
        let create_log_schema_sql = include_str!("../../sql/02-create-log-schema.sql");
        for query in create_log_schema_sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }

    /// 대상별 이력 조회 (오래된 순)
    pub async fn history_for(&self, related_id: Uuid) -> MarketResult<Vec<HistoryStatus>> {
        sqlx::query_as::<_, HistoryStatus>(queries::GET_HISTORY_BY_RELATED_ID)
            .bind(related_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(MarketError::from)
    }

    /// 사용자별 알림 조회 (최신 순)
    pub async fn notifications_for(&self, user_id: Uuid) -> MarketResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(queries::GET_NOTIFICATIONS_BY_USER)
            .bind(user_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(MarketError::from)
    }
}

#[async_trait]
impl LogSink for PostgresLogSink {
    async fn save_history_status(&self, doc: HistoryStatus) -> MarketResult<()> {
        sqlx::query(queries::INSERT_HISTORY_STATUS)
            .bind(doc.id)
            .bind(doc.related_id)
            .bind(doc.related_type.as_str())
            .bind(&doc.old_status)
            .bind(&doc.new_status)
            .bind(doc.changed_by)
            .bind(doc.timestamp)
            .bind(&doc.note)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn save_notification(&self, doc: Notification) -> MarketResult<()> {
        sqlx::query(queries::INSERT_NOTIFICATION)
            .bind(doc.id)
            .bind(doc.user_id)
            .bind(&doc.title)
            .bind(&doc.message)
            .bind(doc.kind.as_str())
            .bind(doc.related_id)
            .bind(doc.is_read)
            .bind(doc.created_at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
// endregion: --- Postgres Log Sink

// region:    --- Kafka Log Sink
/// 기록을 카프카로 발행하는 구현체 (LogConsumer가 실제 저장)
pub struct KafkaLogSink {
    producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaLogSink {
    pub fn new(producer: Arc<KafkaProducer>, topic: &str) -> Self {
        Self {
            producer,
            topic: topic.to_string(),
        }
    }

    async fn publish(&self, record: LogRecord) -> MarketResult<()> {
        let payload =
            serde_json::to_string(&record).map_err(|e| MarketError::Broker(e.to_string()))?;
        self.producer
            .send_message(&self.topic, &record.key().to_string(), &payload)
            .await
            .map_err(MarketError::Broker)
    }
}

#[async_trait]
impl LogSink for KafkaLogSink {
    async fn save_history_status(&self, doc: HistoryStatus) -> MarketResult<()> {
        self.publish(LogRecord::HistoryStatus(doc)).await
    }

    async fn save_notification(&self, doc: Notification) -> MarketResult<()> {
        self.publish(LogRecord::Notification(doc)).await
    }
}
// endregion: --- Kafka Log Sink

// region:    --- Memory Log Sink
/// 프로세스 내 저장 구현체 (로컬 실행, 테스트용)
#[derive(Default)]
pub struct MemoryLogSink {
    histories: Mutex<Vec<HistoryStatus>>,
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn histories(&self) -> Vec<HistoryStatus> {
        self.histories
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn save_history_status(&self, doc: HistoryStatus) -> MarketResult<()> {
        self.histories
            .lock()
            .map_err(|e| MarketError::Broker(e.to_string()))?
            .push(doc);
        Ok(())
    }

    async fn save_notification(&self, doc: Notification) -> MarketResult<()> {
        self.notifications
            .lock()
            .map_err(|e| MarketError::Broker(e.to_string()))?
            .push(doc);
        Ok(())
    }
}
// endregion: --- Memory Log Sink

// region:    --- Log Consumer
/// 카프카 기록을 소비하여 로그 저장소에 기록
pub struct LogConsumer {
    sink: Arc<PostgresLogSink>,
    kafka_consumer: Arc<KafkaConsumer>,
    topic: String,
}

impl LogConsumer {
    pub fn new(sink: Arc<PostgresLogSink>, kafka_consumer: Arc<KafkaConsumer>, topic: &str) -> Self {
        LogConsumer {
            sink,
            kafka_consumer,
            topic: topic.to_string(),
        }
    }

    /// 소비 시작
    pub async fn start(&self) {
        let sink = Arc::clone(&self.sink);
        if let Err(e) = self
            .kafka_consumer
            .consume_events(&self.topic, move |record: LogRecord| {
                let sink = Arc::clone(&sink);
                Box::pin(async move {
                    Self::process_record(&sink, record)
                        .await
                        .map_err(|e| -> BoxError { Box::new(e) })
                })
            })
            .await
        {
            error!("{:<12} --> 로그 소비 오류: {:?}", "Consumer", e);
        }
    }

    /// 기록 처리
    async fn process_record(sink: &PostgresLogSink, record: LogRecord) -> MarketResult<()> {
        match record {
            LogRecord::HistoryStatus(doc) => {
                info!(
                    "{:<12} --> 이력 저장: {} {} -> {}",
                    "Consumer", doc.related_id, doc.old_status, doc.new_status
                );
                sink.save_history_status(doc).await
            }
            LogRecord::Notification(doc) => {
                info!(
                    "{:<12} --> 알림 저장: 수신자 {} ({})",
                    "Consumer",
                    doc.user_id,
                    doc.kind.as_str()
                );
                sink.save_notification(doc).await
            }
        }
    }
}
// endregion: --- Log Consumer
