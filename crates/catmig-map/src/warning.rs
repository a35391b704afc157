use serde::Serialize;

use catmig_model::ReportEntry;

/// A non-fatal problem met while mapping one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingWarning {
    /// Optional lookup found nothing; the rule wrote nothing.
    UnresolvedLookup {
        target: String,
        table: String,
        code: String,
    },
    /// Unknown code mapped through the table's `*` row.
    FallbackUsed {
        target: String,
        table: String,
        code: String,
    },
}

impl MappingWarning {
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnresolvedLookup { .. } => "Unresolved lookup",
            Self::FallbackUsed { .. } => "Fallback lookup value",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::UnresolvedLookup {
                target,
                table,
                code,
            } => format!("{target}: code '{code}' not found in '{table}'"),
            Self::FallbackUsed {
                target,
                table,
                code,
            } => format!("{target}: code '{code}' mapped to the default of '{table}'"),
        }
    }

    /// `(table, code)` of a lookup that found nothing.
    pub fn unresolved(&self) -> Option<(&str, &str)> {
        match self {
            Self::UnresolvedLookup { table, code, .. } => Some((table, code)),
            _ => None,
        }
    }

    pub fn to_report_entry(&self) -> ReportEntry {
        ReportEntry::new(self.category(), self.message())
    }
}
