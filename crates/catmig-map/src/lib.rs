//! Rule-driven mapping of legacy records into target records.
//!
//! A [`RuleSet`] holds the tabular rules of one object type. A
//! [`RecordMapper`] applies it to one [`catmig_model::SourceRecord`] at a
//! time through the shared [`RuleEngine`], resolving codes against the
//! run's reference data and stamping the generated identifier last.

#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod mapper;
pub mod profile;
pub mod rule_set;
pub mod warning;

pub use engine::{MappedRecord, MappingContext, RuleEngine};
pub use error::{RecordError, RuleSetError};
pub use mapper::{MapperRegistry, RecordMapper, RuleMapper};
pub use profile::ObjectProfile;
pub use rule_set::RuleSet;
pub use warning::MappingWarning;
