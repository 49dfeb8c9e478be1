//! Postgres ledger backend.

use crate::domain::records::ErrorRecord;
use crate::ports::ledger::{LedgerError, ProcessingLedger};
use crate::config::PostgresConfig;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

const CREATE_PROCESSED_VIDEOS: &str = r#"
    CREATE TABLE IF NOT EXISTS processed_videos (
        video_id     BIGINT PRIMARY KEY,
        processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_PROCESS_ERRORS: &str = r#"
    CREATE TABLE IF NOT EXISTS process_errors (
        id         BIGSERIAL PRIMARY KEY,
        video_id   BIGINT NOT NULL,
        message    TEXT NOT NULL,
        details    TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
"#;

/// Ledger stored in the `processed_videos` and `process_errors` tables.
#[derive(Clone, Debug)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a small pool and ping the database once.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, sqlx::Error> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(config.ssl_mode.parse::<PgSslMode>()?);

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_PROCESSED_VIDEOS)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_PROCESS_ERRORS)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProcessingLedger for PgLedger {
    async fn is_processed(&self, video_id: i64) -> Result<bool, LedgerError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM processed_videos WHERE video_id = $1)",
        )
        .bind(video_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::new("is_processed", video_id, e))
    }

    async fn mark_processed(&self, video_id: i64) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO processed_videos (video_id) VALUES ($1) ON CONFLICT (video_id) DO NOTHING",
        )
        .bind(video_id)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::new("mark_processed", video_id, e))?;
        Ok(())
    }

    async fn register_error(&self, record: &ErrorRecord) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO process_errors (video_id, message, details, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.video_id)
        .bind(&record.message)
        .bind(&record.details)
        .bind(record.time)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::new("register_error", record.video_id, e))?;
        Ok(())
    }
}
