use crate::domain::chunks::{merge_chunks, MergeError};
use crate::domain::dash::{prepare_output_dir, transcode_to_dash, TranscodeError};
use crate::domain::records::ErrorRecord;
use crate::domain::task::Task;
use crate::ports::ledger::{LedgerError, ProcessingLedger};
use crate::ports::transcoder::TranscodeExecutor;
use std::error::Error;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// File layout knobs, relative to each task's source directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConverterSettings {
    pub chunk_extension: String,
    pub merged_file_name: String,
    pub manifest_file_name: String,
    pub output_dir: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            chunk_extension: String::from("chunk"),
            merged_file_name: String::from("merged.mp4"),
            manifest_file_name: String::from("manifest.mpd"),
            output_dir: String::from("mpeg-dash"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The ledger already had the video; nothing was touched.
    AlreadyProcessed,
    Processed { manifest: PathBuf },
}

/// The stage a task stopped at, with its cause.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("Failed to check whether the video was processed")]
    Dedup(#[source] LedgerError),

    #[error("Failed to merge chunks")]
    Merge(#[source] MergeError),

    #[error("Failed to create directory for mpeg-dash files")]
    PrepareOutput(#[source] TranscodeError),

    #[error("Failed to convert video to mpeg-dash format")]
    Transcode(#[source] TranscodeError),

    #[error("Failed to remove non-converted file {path:?}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to mark video as processed")]
    Commit(#[source] LedgerError),
}

/// Turns one task into a DASH package: merge, transcode, clean up, commit.
pub struct VideoConverter<L, E> {
    ledger: L,
    executor: E,
    settings: ConverterSettings,
}

impl<L, E> VideoConverter<L, E>
where
    L: ProcessingLedger,
    E: TranscodeExecutor,
{
    pub fn new(ledger: L, executor: E, settings: ConverterSettings) -> Self {
        Self {
            ledger,
            executor,
            settings,
        }
    }

    /// Decode and process one inbound payload.
    ///
    /// Fire-and-forget: failures are logged and, once the video id is known,
    /// appended to the ledger's error log. Nothing is returned to the caller.
    pub async fn handle(&self, payload: &[u8]) {
        let task = match Task::decode(payload) {
            Ok(task) => task,
            Err(e) => {
                error!(error = %e, "Failed to unmarshal task");
                return;
            }
        };

        self.handle_task(&task).await;
    }

    pub async fn handle_task(&self, task: &Task) {
        if let Err(failure) = self.run(task).await {
            // Stage errors already render their own cause.
            let details = failure
                .source()
                .map(|cause| cause.to_string())
                .unwrap_or_default();
            self.record_failure(task.video_id, failure.to_string(), details)
                .await;
        }
    }

    /// Run every stage for `task`, stopping at the first failure.
    ///
    /// Nothing is rolled back. If the transcode fails the merged file stays on
    /// disk; if cleanup or commit fails the package exists but the video is
    /// not marked, so the next run processes it again.
    pub async fn run(&self, task: &Task) -> Result<Completion, StageFailure> {
        let video_id = task.video_id;

        if self
            .ledger
            .is_processed(video_id)
            .await
            .map_err(StageFailure::Dedup)?
        {
            warn!(video_id, "Video was already processed");
            return Ok(Completion::AlreadyProcessed);
        }

        let source_dir = task.source_dir();
        let merged = source_dir.join(&self.settings.merged_file_name);
        let output_dir = source_dir.join(&self.settings.output_dir);
        let manifest = output_dir.join(&self.settings.manifest_file_name);

        info!(video_id, path = ?source_dir, "Merging chunks");
        let summary = merge_chunks(source_dir, &self.settings.chunk_extension, &merged)
            .await
            .map_err(StageFailure::Merge)?;
        info!(
            video_id,
            chunks = summary.chunks,
            bytes = summary.bytes,
            "Chunks merged"
        );

        prepare_output_dir(&output_dir)
            .await
            .map_err(StageFailure::PrepareOutput)?;

        info!(video_id, path = ?source_dir, "Converting video");
        transcode_to_dash(&self.executor, &merged, &manifest)
            .await
            .map_err(StageFailure::Transcode)?;
        info!(video_id, path_converted = ?output_dir, "Video successfully converted to mpeg-dash");

        info!(video_id, path = ?merged, "Deleting non-converted video");
        tokio::fs::remove_file(&merged)
            .await
            .map_err(|source| StageFailure::Cleanup {
                path: merged.clone(),
                source,
            })?;

        self.ledger
            .mark_processed(video_id)
            .await
            .map_err(StageFailure::Commit)?;

        info!(video_id, "Video was successfully processed");
        Ok(Completion::Processed { manifest })
    }

    /// Log a failure and append it to the ledger's error log.
    ///
    /// A ledger write failure here is only logged so it never replaces the
    /// failure being reported.
    pub async fn record_failure(
        &self,
        video_id: i64,
        message: impl Into<String>,
        details: impl Into<String>,
    ) {
        let record = ErrorRecord::new(video_id, message, details);
        error!(video_id, data = %record.to_json(), "Processing error");

        if let Err(e) = self.ledger.register_error(&record).await {
            error!(video_id, error = %e, "Failed to persist processing error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dash::test_support::mock_output;
    use crate::ports::ledger::MockProcessingLedger;
    use crate::ports::transcoder::MockTranscodeExecutor;
    use mockall::predicate::eq;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn chunk_dir(chunks: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        for (name, content) in chunks {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn task_for(video_id: i64, dir: &Path) -> Task {
        Task {
            video_id,
            path: dir.to_path_buf(),
        }
    }

    fn converter(
        ledger: MockProcessingLedger,
        executor: MockTranscodeExecutor,
    ) -> VideoConverter<MockProcessingLedger, MockTranscodeExecutor> {
        VideoConverter::new(ledger, executor, ConverterSettings::default())
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        let dir = chunk_dir(&[("0.chunk", "AA"), ("1.chunk", "BB")]);
        let merged = dir.path().join("merged.mp4");
        let manifest = dir.path().join("mpeg-dash").join("manifest.mpd");

        let mut ledger = MockProcessingLedger::new();
        ledger
            .expect_is_processed()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(false));
        ledger
            .expect_mark_processed()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(()));
        ledger.expect_register_error().times(0);

        let mut executor = MockTranscodeExecutor::new();
        let expected_input = merged.clone();
        executor
            .expect_run()
            .times(1)
            .returning(move |args| {
                assert_eq!(Path::new(&args[1]), expected_input);
                assert_eq!(std::fs::read(&args[1]).unwrap(), b"AABB");
                Ok(mock_output("", "", 0))
            });

        let completion = converter(ledger, executor)
            .run(&task_for(2, dir.path()))
            .await
            .unwrap();

        assert_eq!(completion, Completion::Processed { manifest });
        assert!(!merged.exists());
        assert!(dir.path().join("mpeg-dash").is_dir());
    }

    #[tokio::test]
    async fn test_already_processed_has_no_side_effects() {
        let dir = chunk_dir(&[("0.chunk", "AA"), ("1.chunk", "BB")]);
        let before = dir_entries(dir.path());

        let mut ledger = MockProcessingLedger::new();
        ledger
            .expect_is_processed()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(true));
        ledger.expect_mark_processed().times(0);
        ledger.expect_register_error().times(0);

        let mut executor = MockTranscodeExecutor::new();
        executor.expect_run().times(0);

        let completion = converter(ledger, executor)
            .run(&task_for(2, dir.path()))
            .await
            .unwrap();

        assert_eq!(completion, Completion::AlreadyProcessed);
        assert_eq!(dir_entries(dir.path()), before);
    }

    #[tokio::test]
    async fn test_malformed_payload_touches_nothing() {
        // No expectations: any ledger or executor call panics.
        let ledger = MockProcessingLedger::new();
        let executor = MockTranscodeExecutor::new();

        converter(ledger, executor)
            .handle(br#"{"video_id": "two", "path": "/does/not/exist"}"#)
            .await;
    }

    #[tokio::test]
    async fn test_merge_failure_records_exactly_one_error() {
        let dir = chunk_dir(&[]);

        let mut ledger = MockProcessingLedger::new();
        ledger.expect_is_processed().returning(|_| Ok(false));
        ledger.expect_mark_processed().times(0);
        ledger
            .expect_register_error()
            .withf(|record| {
                record.video_id == 5
                    && record.message == "Failed to merge chunks"
                    && record.details.contains("no *.chunk files")
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut executor = MockTranscodeExecutor::new();
        executor.expect_run().times(0);

        let payload = format!(
            r#"{{"video_id": 5, "path": {}}}"#,
            serde_json::to_string(dir.path()).unwrap()
        );
        converter(ledger, executor).handle(payload.as_bytes()).await;
    }

    #[tokio::test]
    async fn test_transcode_failure_keeps_merged_file() {
        let dir = chunk_dir(&[("0.chunk", "AA")]);

        let mut ledger = MockProcessingLedger::new();
        ledger.expect_is_processed().returning(|_| Ok(false));
        ledger.expect_mark_processed().times(0);
        ledger
            .expect_register_error()
            .withf(|record| {
                record.message == "Failed to convert video to mpeg-dash format"
                    && record.details.contains("moov atom not found")
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut executor = MockTranscodeExecutor::new();
        executor
            .expect_run()
            .times(1)
            .returning(|_| Ok(mock_output("", "moov atom not found", 1)));

        converter(ledger, executor)
            .handle_task(&task_for(3, dir.path()))
            .await;

        assert_eq!(
            std::fs::read(dir.path().join("merged.mp4")).unwrap(),
            b"AA"
        );
    }

    #[tokio::test]
    async fn test_commit_failure_after_cleanup() {
        let dir = chunk_dir(&[("0.chunk", "AA")]);

        let mut ledger = MockProcessingLedger::new();
        ledger.expect_is_processed().returning(|_| Ok(false));
        ledger
            .expect_mark_processed()
            .times(2)
            .returning(|id| Err(LedgerError::new("mark_processed", id, "connection reset")));
        ledger
            .expect_register_error()
            .withf(|record| {
                record.message == "Failed to mark video as processed"
                    && record.details.contains("connection reset")
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut executor = MockTranscodeExecutor::new();
        executor
            .expect_run()
            .returning(|_| Ok(mock_output("", "", 0)));

        let converter = converter(ledger, executor);
        let result = converter.run(&task_for(4, dir.path())).await;
        assert!(matches!(result, Err(StageFailure::Commit(_))));

        assert!(!dir.path().join("merged.mp4").exists());

        // Not marked, so handling the same task again redoes the work.
        converter.handle_task(&task_for(4, dir.path())).await;
        assert!(!dir.path().join("merged.mp4").exists());
    }

    #[tokio::test]
    async fn test_dedup_read_error_stops_before_merge() {
        let dir = chunk_dir(&[("0.chunk", "AA")]);

        let mut ledger = MockProcessingLedger::new();
        ledger
            .expect_is_processed()
            .returning(|id| Err(LedgerError::new("is_processed", id, "timeout")));
        ledger.expect_mark_processed().times(0);
        ledger
            .expect_register_error()
            .times(1)
            .returning(|_| Ok(()));

        let mut executor = MockTranscodeExecutor::new();
        executor.expect_run().times(0);

        converter(ledger, executor)
            .handle_task(&task_for(6, dir.path()))
            .await;

        assert!(!dir.path().join("merged.mp4").exists());
    }

    #[tokio::test]
    async fn test_error_log_failure_is_swallowed() {
        let dir = chunk_dir(&[]);

        let mut ledger = MockProcessingLedger::new();
        ledger.expect_is_processed().returning(|_| Ok(false));
        ledger
            .expect_register_error()
            .times(1)
            .returning(|record| Err(LedgerError::new("register_error", record.video_id, "down")));

        let executor = MockTranscodeExecutor::new();

        converter(ledger, executor)
            .handle_task(&task_for(7, dir.path()))
            .await;
    }

    #[tokio::test]
    async fn test_cleanup_failure_leaves_video_unmarked() {
        let dir = chunk_dir(&[("0.chunk", "AA")]);

        let mut ledger = MockProcessingLedger::new();
        ledger.expect_is_processed().returning(|_| Ok(false));
        ledger.expect_mark_processed().times(0);
        ledger
            .expect_register_error()
            .withf(|record| record.message.starts_with("Failed to remove non-converted file"))
            .times(1)
            .returning(|_| Ok(()));

        // The merged file vanishes while the transcoder runs.
        let mut executor = MockTranscodeExecutor::new();
        executor.expect_run().times(1).returning(|args| {
            std::fs::remove_file(&args[1]).unwrap();
            Ok(mock_output("", "", 0))
        });

        converter(ledger, executor)
            .handle_task(&task_for(8, dir.path()))
            .await;

        assert!(!dir.path().join("merged.mp4").exists());
        assert!(dir.path().join("mpeg-dash").is_dir());
    }
}
