//! Application layer - services that use ports.

pub mod converter;

pub use converter::{Completion, ConverterSettings, StageFailure, VideoConverter};
