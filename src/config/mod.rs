// region:    --- Imports
use crate::error::MarketError;
use std::str::FromStr;
use std::time::Duration;
// endregion: --- Imports

// region:    --- Log Sink Kind
/// 부수 효과(이력/알림) 저장소 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSinkKind {
    Postgres,
    Kafka,
    Memory,
}

impl FromStr for LogSinkKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "kafka" => Ok(Self::Kafka),
            "memory" => Ok(Self::Memory),
            other => Err(MarketError::Config(format!(
                "알 수 없는 LOG_SINK 값: {}",
                other
            ))),
        }
    }
}
// endregion: --- Log Sink Kind

// region:    --- Config
/// 서비스 설정 (환경 변수 기반)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub log_database_url: String,
    pub max_connections: u32,
    pub db_timeout: Duration,
    pub sink_timeout: Duration,
    pub log_sink: LogSinkKind,
    pub kafka_brokers: String,
    pub log_topic: String,
    pub bind_addr: String,
    pub reset_schema: bool,
    pub offer_inbox_limit: i64,
    pub body_limit_bytes: usize,
}

impl Config {
    /// 환경 변수에서 설정 로드 (.env 파일이 있으면 먼저 읽는다)
    pub fn from_env() -> Result<Self, MarketError> {
        dotenv::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| MarketError::Config("DATABASE_URL must be set".to_string()))?;
        let log_database_url =
            std::env::var("LOG_DATABASE_URL").unwrap_or_else(|_| database_url.clone());

        Ok(Self {
            database_url,
            log_database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            db_timeout: Duration::from_secs(env_or("DB_TIMEOUT_SECS", 5)?),
            sink_timeout: Duration::from_secs(env_or("SINK_TIMEOUT_SECS", 5)?),
            log_sink: env_or("LOG_SINK", LogSinkKind::Postgres)?,
            kafka_brokers: std::env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            log_topic: std::env::var("LOG_TOPIC").unwrap_or_else(|_| "market-logs".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            reset_schema: env_or("RESET_SCHEMA", false)?,
            offer_inbox_limit: env_or("OFFER_INBOX_LIMIT", 100)?,
            body_limit_bytes: env_or("BODY_LIMIT_BYTES", 10 * 1024 * 1024)?,
        })
    }

    /// 테스트 및 로컬 실행용 설정
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            log_database_url: database_url.to_string(),
            max_connections: 5,
            db_timeout: Duration::from_secs(5),
            sink_timeout: Duration::from_secs(5),
            log_sink: LogSinkKind::Memory,
            kafka_brokers: "localhost:9092".to_string(),
            log_topic: "market-logs".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            reset_schema: false,
            offer_inbox_limit: 100,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

/// 환경 변수를 읽고 없으면 기본값 사용
fn env_or<T>(key: &str, default: T) -> Result<T, MarketError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| MarketError::Config(format!("{} 값이 잘못되었습니다: {}", key, e))),
        Err(_) => Ok(default),
    }
}
// endregion: --- Config

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_sink_kind() {
        assert_eq!("Kafka".parse::<LogSinkKind>().unwrap(), LogSinkKind::Kafka);
        assert_eq!(" memory ".parse::<LogSinkKind>().unwrap(), LogSinkKind::Memory);
        assert!("mongo".parse::<LogSinkKind>().is_err());
    }

    #[test]
    fn env_or_falls_back_to_default() {
        let value: u64 = env_or("MARKET_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
