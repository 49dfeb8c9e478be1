//! videoconverter - chunked upload to MPEG-DASH worker
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (task, chunks, dash, records)
//! - ports/: Trait definitions (ledger, transcoder)
//! - adapters/: Concrete implementations (ffmpeg, postgres, redis, memory)
//! - application/: The converter service
//! - config: Environment configuration
//!
//! # Features
//! - `postgres`: Postgres-backed ledger
//! - `redis`: Redis-backed ledger

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::{Completion, ConverterSettings, VideoConverter};
pub use config::{LedgerBackend, WorkerConfig};
pub use domain::Task;
