//! Chunk discovery and merging.
//!
//! Uploads arrive as numbered fragments (`0.chunk`, `1.chunk`, ...). The
//! merger orders them by the first number in their file name and streams them
//! one at a time into a single media file.

use regex::Regex;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Index given to chunks whose name carries no usable number.
pub const UNNUMBERED_CHUNK: i64 = -1;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to find any chunk in {dir:?}: {source}")]
    Discovery {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create merged file {path:?}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write chunk {chunk:?}: {source}")]
    ChunkRead {
        chunk: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush merged file {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub chunks: usize,
    pub bytes: u64,
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("static digit pattern"))
}

/// Sequence number of a chunk: the first run of digits in its base name,
/// or [`UNNUMBERED_CHUNK`] when there is none or it does not fit an `i64`.
pub fn chunk_index(path: &Path) -> i64 {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    digits()
        .find(&name)
        .and_then(|found| found.as_str().parse().ok())
        .unwrap_or(UNNUMBERED_CHUNK)
}

fn no_chunks(dir: &Path, extension: &str) -> MergeError {
    MergeError::Discovery {
        dir: dir.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::NotFound,
            format!("no *.{} files", extension),
        ),
    }
}

/// Whether the file name matches `*.{extension}`. A bare `.chunk` counts.
fn has_extension(path: &Path, extension: &str) -> bool {
    let suffix = format!(".{}", extension);
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(&suffix))
        .unwrap_or(false)
}

/// List the chunks in `dir` with the given extension, in merge order.
///
/// Chunks are sorted by [`chunk_index`]; equal indexes fall back to the file
/// name so the order never depends on the directory listing. An empty
/// directory is a discovery failure.
pub async fn locate_chunks(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, MergeError> {
    let discovery = |source| MergeError::Discovery {
        dir: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(discovery)?;
    let mut chunks = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discovery)? {
        let path = entry.path();
        if !has_extension(&path, extension) {
            continue;
        }
        if entry.file_type().await.map_err(discovery)?.is_dir() {
            continue;
        }
        chunks.push(path);
    }

    if chunks.is_empty() {
        return Err(no_chunks(dir, extension));
    }

    chunks.sort_by_cached_key(|path| (chunk_index(path), path.file_name().map(OsStr::to_owned)));
    Ok(chunks)
}

/// Concatenate every chunk of `dir` into `output`, in merge order.
///
/// Only one chunk is open at a time. A failure leaves whatever was already
/// written in `output`; removing it is up to the caller.
pub async fn merge_chunks(
    dir: &Path,
    extension: &str,
    output: &Path,
) -> Result<MergeSummary, MergeError> {
    let chunks: Vec<PathBuf> = locate_chunks(dir, extension)
        .await?
        .into_iter()
        .filter(|chunk| chunk != output)
        .collect();

    // A stale merged file is not an upload.
    if chunks.is_empty() {
        return Err(no_chunks(dir, extension));
    }

    let mut merged = File::create(output)
        .await
        .map_err(|source| MergeError::OutputCreate {
            path: output.to_path_buf(),
            source,
        })?;

    let mut bytes = 0;
    for chunk in &chunks {
        let chunk_read = |source| MergeError::ChunkRead {
            chunk: chunk.clone(),
            source,
        };

        let mut input = File::open(chunk).await.map_err(chunk_read)?;
        bytes += tokio::io::copy(&mut input, &mut merged)
            .await
            .map_err(chunk_read)?;
        tracing::debug!(chunk = ?chunk, total_bytes = bytes, "Chunk appended");
    }

    merged
        .flush()
        .await
        .map_err(|source| MergeError::OutputWrite {
            path: output.to_path_buf(),
            source,
        })?;

    Ok(MergeSummary {
        chunks: chunks.len(),
        bytes,
    })
}
