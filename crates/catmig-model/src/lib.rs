#![deny(unsafe_code)]

pub mod error;
pub mod ids;
pub mod object_type;
pub mod render;
pub mod rule;
pub mod source;
pub mod target;
pub mod transaction;

pub use error::{ModelError, Result};
pub use ids::{Identifier, IdentifierGenerator, generate};
pub use object_type::ObjectType;
pub use render::Renderable;
pub use rule::{
    Condition, ConditionEntry, LookupRef, MappingRule, ValueExpr, ValueKind, parse_conditions,
};
pub use source::{SourceRecord, SourceValue, normalize_key};
pub use target::{FieldPath, MAX_ARRAY_INDEX, Segment, TargetRecord};
pub use transaction::{FailureKind, ReportEntry, TransactionResult};
