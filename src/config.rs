//! Configuration loaded from the environment.

use crate::application::converter::ConverterSettings;
use clap::ValueEnum;
use std::env;
use std::fmt;

/// Where the processing ledger lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LedgerBackend {
    Postgres,
    Redis,
    /// Process-local, forgotten on exit. Useful for dry runs.
    Memory,
}

/// Postgres connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    pub ssl_mode: String,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl fmt::Display for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user={} dbname={} host={} port={} sslmode={}",
            self.user, self.database, self.host, self.port, self.ssl_mode
        )
    }
}

/// Configuration for the converter worker.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub postgres: PostgresConfig,
    /// Redis connection URL
    pub redis_url: String,
    pub ledger_backend: LedgerBackend,
    /// Transcoder executable, looked up on PATH when not absolute
    pub ffmpeg_bin: String,
    pub converter: ConverterSettings,
}

impl WorkerConfig {
    /// Load configuration from `.env` and environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| String::from(default));
        let defaults = ConverterSettings::default();

        let port = lookup("POSTGRES_PORT")
            .and_then(|port| port.parse().ok())
            .unwrap_or(5432);
        let ledger_backend = lookup("LEDGER_BACKEND")
            .and_then(|backend| LedgerBackend::from_str(&backend, true).ok())
            .unwrap_or(LedgerBackend::Postgres);

        Self {
            postgres: PostgresConfig {
                user: var("POSTGRES_USER", "myuser"),
                password: var("POSTGRES_PASSWORD", "mypassword"),
                database: var("POSTGRES_DB", "mydb"),
                host: var("POSTGRES_HOST", "postgres_container"),
                port,
                ssl_mode: var("POSTGRES_SSLMODE", "disable"),
            },
            redis_url: var("REDIS_URL", "redis://127.0.0.1/"),
            ledger_backend,
            ffmpeg_bin: var("FFMPEG_BIN", "ffmpeg"),
            converter: ConverterSettings {
                chunk_extension: var("CHUNK_EXTENSION", &defaults.chunk_extension),
                merged_file_name: var("MERGED_FILE_NAME", &defaults.merged_file_name),
                manifest_file_name: var("MANIFEST_FILE_NAME", &defaults.manifest_file_name),
                output_dir: var("DASH_OUTPUT_DIR", &defaults.output_dir),
            },
        }
    }
}
