mod jobs;
mod misc;
mod query;
mod tally;

pub use jobs::{JobDuration, JobRecord, JobState, Status};
pub use query::{build_command, normalize_memory, parse, Parsed, DELIMITER, HEADER_MARKER};
pub use tally::StatusTally;
