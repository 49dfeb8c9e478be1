use crate::domain::records::ErrorRecord;
use async_trait::async_trait;
use std::error::Error;
use thiserror::Error;

/// Persistence failure reported by a ledger backend.
#[derive(Debug, Error)]
#[error("ledger {operation} failed for video_id={video_id}: {source}")]
pub struct LedgerError {
    pub operation: &'static str,
    pub video_id: i64,
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

impl LedgerError {
    pub fn new(
        operation: &'static str,
        video_id: i64,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            video_id,
            source: source.into(),
        }
    }
}

/// Persistent record of processed videos plus the error log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessingLedger: Send + Sync {
    /// True iff `video_id` was already marked processed.
    async fn is_processed(&self, video_id: i64) -> Result<bool, LedgerError>;

    /// Record `video_id` as processed. Marking an id twice is not an error.
    async fn mark_processed(&self, video_id: i64) -> Result<(), LedgerError>;

    /// Append an error record.
    async fn register_error(&self, record: &ErrorRecord) -> Result<(), LedgerError>;
}
