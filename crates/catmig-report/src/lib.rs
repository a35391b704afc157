//! Migration report aggregation and output writers.

#![deny(unsafe_code)]

pub mod error;
pub mod outcome;
pub mod report;
pub mod retry;
pub mod sink;
pub mod writer;

pub use error::{ReportError, Result};
pub use outcome::RecordOutcome;
pub use report::{CategoryStats, DEFAULT_MAX_EXAMPLES, MigrationReport, ReferenceTableStats};
pub use retry::RetryWriter;
pub use sink::RunSink;
pub use writer::{OutputMode, RecordWriter};
