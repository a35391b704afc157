use catmig_model::{SourceRecord, TransactionResult};

/// Everything the report and writers need to know about one record.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub transaction: TransactionResult,
    /// Kept only for retryable failures, so they can be resubmitted.
    pub source: Option<SourceRecord>,
    /// Target paths written by mapping rules.
    pub populated: Vec<String>,
    /// `(table, code)` of optional lookups that found nothing.
    pub unresolved: Vec<(String, String)>,
}

impl RecordOutcome {
    pub fn new(transaction: TransactionResult) -> Self {
        Self {
            transaction,
            source: None,
            populated: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: SourceRecord) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_populated(mut self, populated: Vec<String>) -> Self {
        self.populated = populated;
        self
    }

    pub fn with_unresolved(mut self, unresolved: Vec<(String, String)>) -> Self {
        self.unresolved = unresolved;
        self
    }
}
