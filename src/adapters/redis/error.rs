//! Redis error types for the ledger adapter.

use deadpool_redis::{CreatePoolError, PoolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedisLedgerError {
    #[error("Redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Create pool error: {0}")]
    CreatePool(#[from] CreatePoolError),
}
