//! Domain layer - chunk merging, DASH packaging and the task model.

pub mod chunks;
pub mod dash;
pub mod records;
pub mod task;

pub use chunks::{merge_chunks, MergeError, MergeSummary};
pub use dash::TranscodeError;
pub use records::ErrorRecord;
pub use task::{MalformedTask, Task};
