//! MPEG-DASH packaging through the external transcoder.

use crate::ports::transcoder::TranscodeExecutor;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use thiserror::Error;

/// ffmpeg muxer producing a DASH manifest plus media segments.
pub const DASH_FORMAT: &str = "dash";

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to create directory {dir:?} for mpeg-dash files: {source}")]
    DirectoryCreate {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch transcoder: {0}")]
    Launch(#[source] io::Error),

    #[error("transcoder exited with {status} [outstream: {output}]")]
    Failed { status: ExitStatus, output: String },
}

impl TranscodeError {
    /// Diagnostic output captured from the transcoder, if it ran.
    pub fn output(&self) -> Option<&str> {
        match self {
            TranscodeError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub fn dash_args(input: &Path, manifest: &Path) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.into(),
        "-f".into(),
        DASH_FORMAT.into(),
        manifest.into(),
    ]
}

/// stdout followed by stderr, lossily decoded.
pub fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

/// Ensure the directory that will hold the manifest exists.
pub async fn prepare_output_dir(dir: &Path) -> Result<(), TranscodeError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| TranscodeError::DirectoryCreate {
            dir: dir.to_path_buf(),
            source,
        })
}

/// Package `input` as MPEG-DASH with its manifest written to `manifest`.
///
/// Partial output is left in place on failure.
pub async fn transcode_to_dash<E>(
    executor: &E,
    input: &Path,
    manifest: &Path,
) -> Result<String, TranscodeError>
where
    E: TranscodeExecutor + ?Sized,
{
    if let Some(dir) = manifest.parent() {
        prepare_output_dir(dir).await?;
    }

    let output = executor
        .run(dash_args(input, manifest))
        .await
        .map_err(TranscodeError::Launch)?;

    let combined = combined_output(&output);
    if !output.status.success() {
        return Err(TranscodeError::Failed {
            status: output.status,
            output: combined,
        });
    }

    Ok(combined)
}
