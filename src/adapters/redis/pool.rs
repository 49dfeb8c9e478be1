//! Redis connection pool.

use super::error::RedisLedgerError;
use deadpool_redis::{Config, Connection, Pool, Runtime};

/// Redis-backed processing ledger.
#[derive(Clone)]
pub struct RedisLedger {
    pool: Pool,
}

impl RedisLedger {
    /// Create a new RedisLedger with connection pool.
    pub fn new(redis_url: &str) -> Result<Self, RedisLedgerError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    pub(super) async fn connection(&self) -> Result<Connection, RedisLedgerError> {
        Ok(self.pool.get().await?)
    }

    /// Round-trip a PING so a bad URL fails at startup rather than mid-task.
    pub async fn ping(&self) -> Result<(), RedisLedgerError> {
        let mut conn = self.connection().await?;
        deadpool_redis::redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
