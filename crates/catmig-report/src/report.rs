//! Run statistics.
//!
//! Counts only ever grow. Example messages are capped per category so a
//! failure repeated on every record does not grow the report without bound.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catmig_model::{FailureKind, ObjectType, ReportEntry};
use catmig_standards::TableSummary;

use crate::outcome::RecordOutcome;

pub const DEFAULT_MAX_EXAMPLES: usize = 5;

/// Running count and first few messages of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub count: u64,
    pub examples: Vec<String>,
}

/// Reference table loaded for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTableStats {
    pub name: String,
    pub entries: usize,
    pub has_fallback: bool,
    pub fingerprint: String,
}

impl From<TableSummary> for ReferenceTableStats {
    fn from(summary: TableSummary) -> Self {
        Self {
            name: summary.name,
            entries: summary.entries,
            has_fallback: summary.has_fallback,
            fingerprint: summary.fingerprint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub object_type: ObjectType,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub max_examples: usize,
    pub processed: u64,
    pub succeeded: u64,
    pub failed_retryable: u64,
    pub failed_permanent: u64,
    /// Failures by category.
    pub failures: BTreeMap<String, CategoryStats>,
    /// Non-fatal notes by category.
    pub warnings: BTreeMap<String, CategoryStats>,
    /// Successful records that populated each target path.
    pub field_counts: BTreeMap<String, u64>,
    /// table -> code -> occurrences of optional lookups that found nothing.
    pub unresolved_lookups: BTreeMap<String, BTreeMap<String, u64>>,
    pub reference_tables: Vec<ReferenceTableStats>,
}

impl MigrationReport {
    pub fn new(object_type: ObjectType, max_examples: usize) -> Self {
        Self {
            object_type,
            started_at: Utc::now(),
            finished_at: None,
            max_examples,
            processed: 0,
            succeeded: 0,
            failed_retryable: 0,
            failed_permanent: 0,
            failures: BTreeMap::new(),
            warnings: BTreeMap::new(),
            field_counts: BTreeMap::new(),
            unresolved_lookups: BTreeMap::new(),
            reference_tables: Vec::new(),
        }
    }

    pub fn with_reference_tables(mut self, tables: Vec<TableSummary>) -> Self {
        self.reference_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Fold one record's outcome into the totals.
    pub fn record(&mut self, outcome: &RecordOutcome) {
        let transaction = &outcome.transaction;
        self.processed += 1;
        let subject = transaction.legacy_id().unwrap_or("(no legacy id)");

        match transaction.failure_kind() {
            None => {
                self.succeeded += 1;
                for path in &outcome.populated {
                    *self.field_counts.entry(path.clone()).or_default() += 1;
                }
            }
            Some(kind) => {
                match kind {
                    FailureKind::Transient => self.failed_retryable += 1,
                    FailureKind::Permanent => self.failed_permanent += 1,
                }
                let category = transaction.failure_category().unwrap_or("Uncategorized");
                let message = transaction
                    .error_message()
                    .unwrap_or_else(|| transaction.report_message());
                add(
                    &mut self.failures,
                    self.max_examples,
                    category,
                    format!("{subject}: {message}"),
                );
            }
        }

        for ReportEntry { category, message } in transaction.notes() {
            add(
                &mut self.warnings,
                self.max_examples,
                category,
                format!("{subject}: {message}"),
            );
        }
        for (table, code) in &outcome.unresolved {
            *self
                .unresolved_lookups
                .entry(table.clone())
                .or_default()
                .entry(code.clone())
                .or_default() += 1;
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failed(&self) -> u64 {
        self.failed_retryable + self.failed_permanent
    }

    /// No record failed permanently.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_permanent == 0
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn add(
    categories: &mut BTreeMap<String, CategoryStats>,
    max_examples: usize,
    category: &str,
    example: String,
) {
    let stats = categories.entry(category.to_string()).or_default();
    stats.count += 1;
    if stats.examples.len() < max_examples {
        stats.examples.push(example);
    }
}
