// region:    --- Imports
use crate::config::Config;
use crate::error::{MarketError, MarketResult};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, timeout: Duration) -> MarketResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .create()
            .map_err(|e| MarketError::Broker(format!("Producer creation error: {}", e)))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), String> {
        debug!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
}

/// KafkaConsumer 구현
impl KafkaConsumer {
    pub fn new(brokers: &str, group_id: &str) -> MarketResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(|e| MarketError::Broker(format!("Consumer creation failed: {}", e)))?;

        Ok(KafkaConsumer {
            consumer: Arc::new(consumer),
        })
    }

    /// 메시지 소비 (역직렬화 후 handler 호출)
    pub async fn consume_events<T, F, Fut>(&self, topic: &str, handler: F) -> Result<(), BoxError>
    where
        T: DeserializeOwned + std::fmt::Debug,
        F: Fn(T) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        info!(
            "{:<12} --> Kafka 메시지 소비 시작: topic={}",
            "Consumer", topic
        );
        self.consumer.subscribe(&[topic])?;

        loop {
            match self.consumer.recv().await {
                Ok(message) => {
                    debug!(
                        "{:<12} --> 메시지 수신: topic={}, partition={}, offset={}",
                        "Consumer",
                        message.topic(),
                        message.partition(),
                        message.offset()
                    );

                    if let Some(payload) = message.payload() {
                        match serde_json::from_slice::<T>(payload) {
                            Ok(record) => {
                                debug!("{:<12} --> deserialize 성공: {:?}", "Consumer", record);

                                if let Err(e) = handler(record).await {
                                    error!(
                                        "{:<12} --> Kafka 메시지 처리 오류: {:?}",
                                        "Consumer", e
                                    );
                                }
                            }
                            Err(e) => error!("{:<12} --> deserialize 오류: {:?}", "Consumer", e),
                        }
                    } else {
                        warn!("{:<12} --> 빈 페이로드 수신", "Consumer");
                    }
                }
                Err(e) => error!("{:<12} --> 메시지 수신 오류: {:?}", "Consumer", e),
            }
        }
    }
}

// endregion: --- Kafka Consumer

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: Arc<KafkaProducer>,
    consumer: Arc<KafkaConsumer>,
    brokers: String,
}

/// KafkaManager 구현
impl KafkaManager {
    pub fn new(config: &Config) -> MarketResult<Self> {
        let brokers = config.kafka_brokers.clone();
        let group_id = "market-logs-group".to_string();

        let producer = Arc::new(KafkaProducer::new(&brokers, config.sink_timeout)?);
        let consumer = Arc::new(KafkaConsumer::new(&brokers, &group_id)?);

        Ok(KafkaManager {
            producer,
            consumer,
            brokers,
        })
    }

    /// 프로듀서 반환
    pub fn get_producer(&self) -> Arc<KafkaProducer> {
        Arc::clone(&self.producer)
    }

    /// 컨슈머 반환
    pub fn get_consumer(&self) -> Arc<KafkaConsumer> {
        Arc::clone(&self.consumer)
    }

    /// 브로커 연결 확인 (메타데이터 조회)
    pub async fn initialize(&self) -> Result<(), String> {
        info!("{:<12} --> Kafka 연결 확인 시작", "Manager");

        let max_attempts = 10;
        for attempt in 1..=max_attempts {
            let consumer = Arc::clone(&self.consumer.consumer);
            let probe = tokio::task::spawn_blocking(move || {
                consumer
                    .fetch_metadata(None, Duration::from_secs(1))
                    .map(|metadata| metadata.brokers().len())
            });

            match probe.await {
                Ok(Ok(brokers)) if brokers > 0 => {
                    info!("{:<12} --> Kafka 브로커 {}개 확인", "Manager", brokers);
                    return Ok(());
                }
                Ok(Ok(_)) => warn!("{:<12} --> 사용 가능한 브로커 없음", "Manager"),
                Ok(Err(e)) => warn!(
                    "{:<12} --> Kafka 연결 대기 중... (시도: {}/{}): {:?}",
                    "Manager", attempt, max_attempts, e
                ),
                Err(e) => error!("{:<12} --> Kafka 연결 확인 작업 실패: {:?}", "Manager", e),
            }
            time::sleep(Duration::from_millis(500)).await;
        }

        Err("Kafka 연결 확인 실패".to_string())
    }

    /// 토픽 생성
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), String> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        match admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
        {
            Ok(_) => {
                info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", topic_name);
                Ok(())
            }
            Err(e) => {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
                Err(format!("토픽 생성 실패: {:?}", e))
            }
        }
    }
}

// endregion: --- Kafka Manager
