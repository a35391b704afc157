//! Per-record outcome of a migration run.

use serde::{Deserialize, Serialize};

use crate::render::Renderable;
use crate::target::TargetRecord;

/// Whether a failed record may succeed on a later pass without edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Missing reference data or another temporary gap.
    Transient,
    /// A defect in the source data; needs a manual fix.
    Permanent,
}

/// A categorized, human-readable note attached to an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportEntry {
    pub category: String,
    pub message: String,
}

impl ReportEntry {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }
}

/// Outcome of transforming one source record.
///
/// Built once through [`TransactionResult::success`] or
/// [`TransactionResult::failure`]; a failed outcome never carries a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResult {
    was_successful: bool,
    should_be_retried: bool,
    result: Option<TargetRecord>,
    error_message: Option<String>,
    report_message: String,
    legacy_id: Option<String>,
    /// Report category of the failure, if any.
    failure_category: Option<String>,
    /// Non-fatal notes, in the order they were raised.
    notes: Vec<ReportEntry>,
}

impl TransactionResult {
    pub fn success(
        record: TargetRecord,
        legacy_id: Option<String>,
        report_message: impl Into<String>,
        notes: Vec<ReportEntry>,
    ) -> Self {
        Self {
            was_successful: true,
            should_be_retried: false,
            result: Some(record),
            error_message: None,
            report_message: report_message.into(),
            legacy_id,
            failure_category: None,
            notes,
        }
    }

    pub fn failure(
        kind: FailureKind,
        legacy_id: Option<String>,
        failure: ReportEntry,
        report_message: impl Into<String>,
        notes: Vec<ReportEntry>,
    ) -> Self {
        Self {
            was_successful: false,
            should_be_retried: kind == FailureKind::Transient,
            result: None,
            error_message: Some(failure.message),
            report_message: report_message.into(),
            legacy_id,
            failure_category: Some(failure.category),
            notes,
        }
    }

    pub fn was_successful(&self) -> bool {
        self.was_successful
    }

    pub fn should_be_retried(&self) -> bool {
        self.should_be_retried
    }

    pub fn result(&self) -> Option<&TargetRecord> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<TargetRecord> {
        self.result
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn report_message(&self) -> &str {
        &self.report_message
    }

    pub fn legacy_id(&self) -> Option<&str> {
        self.legacy_id.as_deref()
    }

    pub fn failure_category(&self) -> Option<&str> {
        self.failure_category.as_deref()
    }

    pub fn notes(&self) -> &[ReportEntry] {
        &self.notes
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match (self.was_successful, self.should_be_retried) {
            (true, _) => None,
            (false, true) => Some(FailureKind::Transient),
            (false, false) => Some(FailureKind::Permanent),
        }
    }
}

impl Renderable for TransactionResult {
    fn to_display_string(&self) -> String {
        let status = match self.failure_kind() {
            None => "ok",
            Some(FailureKind::Transient) => "retry",
            Some(FailureKind::Permanent) => "failed",
        };
        match &self.legacy_id {
            Some(id) => format!("[{status}] {id}: {}", self.report_message),
            None => format!("[{status}] {}", self.report_message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_never_carries_a_record() {
        let result = TransactionResult::failure(
            FailureKind::Permanent,
            Some("L1".to_string()),
            ReportEntry::new("Schema violation", "title is required"),
            "record rejected",
            Vec::new(),
        );
        assert!(!result.was_successful());
        assert!(result.result().is_none());
        assert!(!result.should_be_retried());
        assert_eq!(result.error_message(), Some("title is required"));
        assert_eq!(result.failure_category(), Some("Schema violation"));
    }

    #[test]
    fn transient_failures_are_retried() {
        let result = TransactionResult::failure(
            FailureKind::Transient,
            None,
            ReportEntry::new("Reference data not loaded", "table 'locations'"),
            "retry later",
            Vec::new(),
        );
        assert!(result.should_be_retried());
        assert_eq!(result.failure_kind(), Some(FailureKind::Transient));
        assert_eq!(result.to_display_string(), "[retry] retry later");
    }

    #[test]
    fn success_is_never_retried() {
        let result = TransactionResult::success(
            TargetRecord::new(),
            Some("L1".to_string()),
            "mapped",
            vec![],
        );
        assert!(result.was_successful());
        assert!(!result.should_be_retried());
        assert!(result.error_message().is_none());
        assert_eq!(result.to_display_string(), "[ok] L1: mapped");
    }
}
