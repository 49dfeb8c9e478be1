//! Redis ledger backend.
//!
//! - processed video ids live in one set
//! - error records are JSON strings pushed onto a list per video

mod error;
mod ledger;
mod pool;

pub use error::RedisLedgerError;
pub use pool::RedisLedger;

/// Redis key constants
const PROCESSED_SET: &str = "videoconverter:processed";
const ERRORS_PREFIX: &str = "videoconverter:errors:";

fn errors_key(video_id: i64) -> String {
    format!("{}{}", ERRORS_PREFIX, video_id)
}
