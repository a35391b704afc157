//! Reading legacy records and mapping rule tables.

pub mod error;
pub mod reader;
pub mod rules;

pub use error::{IngestError, Result};
pub use reader::{RecordReader, SourceFormat, read_delimited, read_json_lines, read_records};
pub use rules::{load_rule_table, parse_rule_table};
