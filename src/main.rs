// region:    --- Imports
use market_service::auth::AccessGuard;
use market_service::config::{Config, LogSinkKind};
use market_service::database::DatabaseManager;
use market_service::handlers::{self, AppState};
use market_service::log_sink::{
    KafkaLogSink, LogConsumer, LogSink, MemoryLogSink, PostgresLogSink, SideEffects,
};
use market_service::message_broker::KafkaManager;
use market_service::offer::commands::OfferEngine;
use market_service::order::commands::OrderEngine;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new(&config).await?);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database(config.reset_schema).await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 이력/알림 저장소 구성
    let sink = build_log_sink(&config).await?;
    let effects = SideEffects::new(sink, config.sink_timeout);

    let guard = Arc::new(AccessGuard::new(Arc::clone(&db_manager)));
    let state = AppState {
        db_manager: Arc::clone(&db_manager),
        offers: Arc::new(OfferEngine::new(
            Arc::clone(&db_manager),
            Arc::clone(&guard),
            effects.clone(),
            config.offer_inbox_limit,
        )),
        orders: Arc::new(OrderEngine::new(
            Arc::clone(&db_manager),
            Arc::clone(&guard),
            effects,
        )),
    };

    // 라우터 설정
    let routes_all = handlers::routes(state, config.body_limit_bytes);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

/// 설정에 따른 로그 저장소 생성
async fn build_log_sink(config: &Config) -> Result<Arc<dyn LogSink>, Box<dyn std::error::Error>> {
    match config.log_sink {
        LogSinkKind::Memory => {
            warn!(
                "{:<12} --> 메모리 로그 저장소 사용 (재시작 시 유실)",
                "Main"
            );
            Ok(Arc::new(MemoryLogSink::new()))
        }
        LogSinkKind::Postgres => {
            let sink: Arc<dyn LogSink> = postgres_log_sink(config).await?;
            Ok(sink)
        }
        LogSinkKind::Kafka => {
            // Kafka 매니저 생성 및 초기화
            let kafka_manager = KafkaManager::new(config)?;
            if let Err(e) = kafka_manager.initialize().await {
                error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> Kafka 초기화 성공", "Main");

            // 토픽 생성
            kafka_manager.create_topic(&config.log_topic, 5, 1).await?;

            // 로그 소비 시작
            let store = postgres_log_sink(config).await?;
            let consumer = LogConsumer::new(store, kafka_manager.get_consumer(), &config.log_topic);
            tokio::spawn(async move {
                consumer.start().await;
            });

            Ok(Arc::new(KafkaLogSink::new(
                kafka_manager.get_producer(),
                &config.log_topic,
            )))
        }
    }
}

/// 로그 저장소 연결 및 테이블 생성
async fn postgres_log_sink(
    config: &Config,
) -> Result<Arc<PostgresLogSink>, Box<dyn std::error::Error>> {
    let pool = DatabaseManager::connect(&config.log_database_url, config).await?;
    let sink = Arc::new(PostgresLogSink::new(Arc::new(pool)));
    sink.initialize().await?;
    info!("{:<12} --> 로그 저장소 초기화 성공", "Main");
    Ok(sink)
}
// endregion: --- Main
