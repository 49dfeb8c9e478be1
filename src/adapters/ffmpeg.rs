use crate::ports::transcoder::TranscodeExecutor;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Runs the real ffmpeg binary.
#[derive(Clone, Debug)]
pub struct FfmpegExecutor {
    binary: OsString,
}

impl FfmpegExecutor {
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TranscodeExecutor for FfmpegExecutor {
    async fn run(&self, args: Vec<OsString>) -> io::Result<Output> {
        tracing::debug!(binary = ?self.binary, ?args, "Launching transcoder");
        Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
    }
}
