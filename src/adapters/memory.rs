use crate::domain::records::ErrorRecord;
use crate::ports::ledger::{LedgerError, ProcessingLedger};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct LedgerState {
    processed: HashSet<i64>,
    errors: Vec<ErrorRecord>,
}

/// Process-local ledger. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn errors(&self) -> Vec<ErrorRecord> {
        self.state.lock().await.errors.clone()
    }
}

#[async_trait]
impl ProcessingLedger for InMemoryLedger {
    async fn is_processed(&self, video_id: i64) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.processed.contains(&video_id))
    }

    async fn mark_processed(&self, video_id: i64) -> Result<(), LedgerError> {
        self.state.lock().await.processed.insert(video_id);
        Ok(())
    }

    async fn register_error(&self, record: &ErrorRecord) -> Result<(), LedgerError> {
        self.state.lock().await.errors.push(record.clone());
        Ok(())
    }
}
