use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::process::Output;

/// Runs the external transcoding tool with the given arguments.
///
/// Implementations only launch the process and report what it did: the exit
/// status and everything it wrote to stdout and stderr.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscodeExecutor: Send + Sync {
    async fn run(&self, args: Vec<OsString>) -> io::Result<Output>;
}
