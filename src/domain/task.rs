use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One unit of work: a video id and the directory holding its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub video_id: i64,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
#[error("malformed task payload: {0}")]
pub struct MalformedTask(#[from] serde_json::Error);

impl Task {
    /// Decode a task from the raw JSON payload delivered by the transport.
    pub fn decode(payload: &[u8]) -> Result<Self, MalformedTask> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn source_dir(&self) -> &Path {
        &self.path
    }
}
