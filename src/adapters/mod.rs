//! Adapters - Concrete implementations of ports.

pub mod ffmpeg;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use ffmpeg::FfmpegExecutor;
pub use memory::InMemoryLedger;

#[cfg(feature = "postgres")]
pub use postgres::PgLedger;

#[cfg(feature = "redis")]
pub use self::redis::RedisLedger;
