use crate::config::Config;
use crate::error::{MarketError, MarketResult};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
    timeout: Duration,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn new(config: &Config) -> MarketResult<Self> {
        let pool = Self::connect(&config.database_url, config).await?;
        info!(
            "{:<12} --> 주 저장소 연결 완료 (max_connections={})",
            "Database", config.max_connections
        );
        Ok(Self {
            pool: Arc::new(pool),
            timeout: config.db_timeout,
        })
    }

    /// 풀 생성 (로그 저장소도 같은 방식으로 연결한다)
    pub async fn connect(url: &str, config: &Config) -> MarketResult<PgPool> {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.db_timeout)
            .connect(url)
            .await
            .map_err(MarketError::from)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 주 저장소 작업에 시간 제한 적용
    /// 시간 초과 시 future가 drop 되므로 진행 중인 트랜잭션은 롤백된다.
    pub async fn timed<F, R>(&self, fut: F) -> MarketResult<R>
    where
        F: Future<Output = MarketResult<R>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| MarketError::Timeout)?
    }

    /// 트랜잭션 실행
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화
    pub async fn initialize_database(&self, reset: bool) -> Result<(), sqlx::Error> {
        if reset {
            // 00-recreate-db.sql 실행
            let recreate_db_sql = include_str!("../../sql/00-recreate-db.sql");
            self.execute_multi_query(recreate_db_sql).await?;
        }

        // 01-create-schema.sql 실행
        let create_schema_sql = include_str!("../../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;

        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }
}
