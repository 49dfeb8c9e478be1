//! Redis ProcessingLedger implementation.

use super::error::RedisLedgerError;
use super::pool::RedisLedger;
use super::{errors_key, PROCESSED_SET};
use crate::domain::records::ErrorRecord;
use crate::ports::ledger::{LedgerError, ProcessingLedger};
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;

#[async_trait]
impl ProcessingLedger for RedisLedger {
    async fn is_processed(&self, video_id: i64) -> Result<bool, LedgerError> {
        let fail = |e: RedisLedgerError| LedgerError::new("is_processed", video_id, e);

        let mut conn = self.connection().await.map_err(fail)?;
        conn.sismember(PROCESSED_SET, video_id)
            .await
            .map_err(|e| fail(e.into()))
    }

    async fn mark_processed(&self, video_id: i64) -> Result<(), LedgerError> {
        let fail = |e: RedisLedgerError| LedgerError::new("mark_processed", video_id, e);

        let mut conn = self.connection().await.map_err(fail)?;
        // SADD on an existing member is a no-op, which makes this an upsert.
        conn.sadd::<_, _, ()>(PROCESSED_SET, video_id)
            .await
            .map_err(|e| fail(e.into()))
    }

    async fn register_error(&self, record: &ErrorRecord) -> Result<(), LedgerError> {
        let fail = |e: RedisLedgerError| LedgerError::new("register_error", record.video_id, e);

        let json = serde_json::to_string(record).map_err(|e| fail(e.into()))?;
        let mut conn = self.connection().await.map_err(fail)?;
        conn.rpush::<_, _, ()>(errors_key(record.video_id), json)
            .await
            .map_err(|e| fail(e.into()))
    }
}
