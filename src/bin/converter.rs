//! Converter Binary
//!
//! Processes one chunked upload into an MPEG-DASH package:
//! 1. Connects to the configured ledger (Postgres, Redis or in-memory).
//! 2. Hands the task payload to the VideoConverter.
//!
//! Environment Variables:
//! - POSTGRES_USER / POSTGRES_PASSWORD / POSTGRES_DB / POSTGRES_HOST / POSTGRES_PORT / POSTGRES_SSLMODE
//! - REDIS_URL: Redis connection URL
//! - LEDGER_BACKEND: postgres, redis or memory
//! - FFMPEG_BIN: transcoder executable
//! - CHUNK_EXTENSION / MERGED_FILE_NAME / MANIFEST_FILE_NAME / DASH_OUTPUT_DIR

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use videoconverter::adapters::{FfmpegExecutor, InMemoryLedger};
use videoconverter::ports::ProcessingLedger;
use videoconverter::{ConverterSettings, LedgerBackend, VideoConverter, WorkerConfig};

#[derive(Parser, Debug)]
#[command(name = "videoconverter", version, about = "Merge uploaded chunks and package them as MPEG-DASH")]
struct Args {
    /// Task payload, e.g. {"video_id": 2, "path": "uploads/2"}. Read from stdin when omitted.
    payload: Option<String>,

    /// Ledger backend, overrides LEDGER_BACKEND
    #[arg(long, value_enum)]
    ledger: Option<LedgerBackend>,

    /// Name of the intermediate merged file, overrides MERGED_FILE_NAME
    #[arg(long)]
    merged_name: Option<String>,

    /// Name of the DASH manifest, overrides MANIFEST_FILE_NAME
    #[arg(long)]
    manifest_name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = WorkerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Some(backend) = args.ledger {
        config.ledger_backend = backend;
    }
    if let Some(name) = args.merged_name {
        config.converter.merged_file_name = name;
    }
    if let Some(name) = args.manifest_name {
        config.converter.manifest_file_name = name;
    }

    let payload = match args.payload {
        Some(payload) => payload.into_bytes(),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("Failed to read task payload from stdin")?;
            buf
        }
    };

    let executor = FfmpegExecutor::new(&config.ffmpeg_bin);
    let settings = config.converter.clone();

    match config.ledger_backend {
        #[cfg(feature = "postgres")]
        LedgerBackend::Postgres => {
            let ledger = videoconverter::adapters::PgLedger::connect(&config.postgres)
                .await
                .with_context(|| format!("Could not connect to postgres ({})", config.postgres))?;
            tracing::info!(database = %config.postgres, "Connected successfully to database");
            ledger
                .ensure_schema()
                .await
                .context("Failed to create ledger tables")?;
            convert(ledger, executor, settings, &payload).await;
        }
        #[cfg(feature = "redis")]
        LedgerBackend::Redis => {
            let ledger = videoconverter::adapters::RedisLedger::new(&config.redis_url)
                .context("Failed to create Redis pool")?;
            ledger
                .ping()
                .await
                .with_context(|| format!("Could not reach Redis at {}", config.redis_url))?;
            tracing::info!(redis_url = %config.redis_url, "Connected successfully to Redis");
            convert(ledger, executor, settings, &payload).await;
        }
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory ledger, nothing will be persisted");
            convert(InMemoryLedger::new(), executor, settings, &payload).await;
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("ledger backend {:?} is not compiled in", other),
    }

    Ok(())
}

async fn convert<L>(ledger: L, executor: FfmpegExecutor, settings: ConverterSettings, payload: &[u8])
where
    L: ProcessingLedger,
{
    VideoConverter::new(ledger, executor, settings)
        .handle(payload)
        .await;
}
