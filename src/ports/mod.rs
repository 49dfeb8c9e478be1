//! Ports - capabilities the converter depends on.

pub mod ledger;
pub mod transcoder;

pub use ledger::{LedgerError, ProcessingLedger};
pub use transcoder::TranscodeExecutor;
