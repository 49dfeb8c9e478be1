use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only trace of a failed processing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub video_id: i64,
    pub message: String,
    pub details: String,
    pub time: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(video_id: i64, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            video_id,
            message: message.into(),
            details: details.into(),
            time: Utc::now(),
        }
    }

    /// Single-line JSON form used in logs and in the Redis error lists.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}
