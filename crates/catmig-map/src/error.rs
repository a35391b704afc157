//! Mapping errors.
//!
//! [`RuleSetError`] stops the run: no record of that object type can be
//! mapped correctly. [`RecordError`] fails one record and is turned into a
//! failed transaction by the caller.

use catmig_model::{FailureKind, ModelError, ObjectType, ReportEntry, ValueKind};
use catmig_standards::Unresolved;

#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("no mapping rules for {object_type}")]
    Empty { object_type: ObjectType },

    #[error("rule {rule} targets 'id', which is always generated")]
    GeneratedField { rule: String },

    #[error("rule {rule} has neither a source nor a default")]
    NothingToWrite { rule: String },

    #[error("no mapper registered for {object_type}")]
    NoMapper { object_type: ObjectType },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Why a single record could not be mapped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("no legacy id in any of: {}", columns.join(", "))]
    MissingLegacyId { columns: Vec<String> },

    #[error("required source field '{source_field}' is missing for {target}")]
    RequiredFieldMissing {
        target: String,
        source_field: String,
    },

    #[error("{target}: {reason}")]
    MandatoryLookupUnresolved { target: String, reason: Unresolved },

    /// The lookup table is missing entirely; a later pass may succeed.
    #[error("{target}: {reason}")]
    ReferenceDataNotLoaded { target: String, reason: Unresolved },

    #[error("malformed source record: {message}")]
    MalformedSource { message: String },

    #[error("{target}: '{value}' is not a valid {kind}")]
    InvalidValue {
        target: String,
        value: String,
        kind: ValueKind,
    },

    #[error("cannot write {target}: {message}")]
    TargetConflict { target: String, message: String },
}

impl RecordError {
    /// Only gaps in loaded reference data are worth a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReferenceDataNotLoaded { .. })
    }

    pub fn failure_kind(&self) -> FailureKind {
        if self.is_retryable() {
            FailureKind::Transient
        } else {
            FailureKind::Permanent
        }
    }

    /// Report category the failure is counted under.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingLegacyId { .. } => "Missing legacy id",
            Self::RequiredFieldMissing { .. } => "Required field missing",
            Self::MandatoryLookupUnresolved { .. } => "Unresolved mandatory lookup",
            Self::ReferenceDataNotLoaded { .. } => "Reference data not loaded",
            Self::MalformedSource { .. } => "Malformed source record",
            Self::InvalidValue { .. } => "Invalid value",
            Self::TargetConflict { .. } => "Target path conflict",
        }
    }

    pub fn to_report_entry(&self) -> ReportEntry {
        ReportEntry::new(self.category(), self.to_string())
    }
}
