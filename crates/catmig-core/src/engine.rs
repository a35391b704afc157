//! Reader → Mapper → Validator → TransactionResult → Report.
//!
//! Every record read yields exactly one [`RecordOutcome`]; per-record
//! problems never escape as errors. Only output failures and setup
//! problems stop a run.

use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::bounded;
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use catmig_ingest::IngestError;
use catmig_map::{MappingContext, MappingWarning, RecordMapper, RuleMapper, RuleSet};
use catmig_model::{
    FailureKind, IdentifierGenerator, MappingRule, ObjectType, Renderable, ReportEntry,
    SourceRecord, TransactionResult,
};
use catmig_report::{MigrationReport, RecordOutcome, RunSink};
use catmig_standards::{ReferenceDataCache, ReferenceDataSource, TableSummary};
use catmig_validate::{SchemaDocuments, SchemaValidator};

/// Records buffered per worker between reader and workers.
const QUEUE_DEPTH_PER_WORKER: usize = 64;

const SCHEMA_VIOLATION: &str = "Schema violation";
const UNREADABLE_RECORD: &str = "Unreadable source record";

/// Transforms records of one object type. Read-only once built, so one
/// engine serves every worker of a parallel run.
pub struct MigrationEngine {
    mapper: Box<dyn RecordMapper>,
    validator: Option<SchemaValidator>,
    resolver: ReferenceDataCache,
    ids: IdentifierGenerator,
}

impl MigrationEngine {
    pub fn new(
        mapper: Box<dyn RecordMapper>,
        resolver: ReferenceDataCache,
        ids: IdentifierGenerator,
    ) -> Self {
        Self {
            mapper,
            validator: None,
            resolver,
            ids,
        }
    }

    pub fn builder(object_type: ObjectType, namespace: impl Into<String>) -> EngineBuilder {
        EngineBuilder::new(object_type, namespace)
    }

    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn object_type(&self) -> ObjectType {
        self.mapper.object_type()
    }

    pub fn resolver(&self) -> &ReferenceDataCache {
        &self.resolver
    }

    pub fn reference_tables(&self) -> Vec<TableSummary> {
        self.resolver.summaries()
    }

    /// Empty report for a run of this engine.
    pub fn new_report(&self, max_examples: usize) -> MigrationReport {
        MigrationReport::new(self.object_type(), max_examples)
            .with_reference_tables(self.reference_tables())
    }

    /// Map and validate one record.
    pub fn process(&self, record: SourceRecord) -> RecordOutcome {
        let context = MappingContext::new(&self.resolver, &self.ids);
        let mapped = match self.mapper.map(&record, &context) {
            Ok(mapped) => mapped,
            Err(error) => {
                let transaction = TransactionResult::failure(
                    error.failure_kind(),
                    self.mapper.legacy_id(&record).ok(),
                    error.to_report_entry(),
                    "record not mapped",
                    Vec::new(),
                );
                debug!(outcome = %transaction.to_display_string(), %error, "record not mapped");
                return keep_source_if_retried(RecordOutcome::new(transaction), record);
            }
        };

        let notes: Vec<ReportEntry> = mapped
            .warnings
            .iter()
            .map(MappingWarning::to_report_entry)
            .collect();
        let unresolved: Vec<(String, String)> = mapped
            .warnings
            .iter()
            .filter_map(MappingWarning::unresolved)
            .map(|(table, code)| (table.to_string(), code.to_string()))
            .collect();

        if let Some(validator) = &self.validator {
            let report = validator.validate(&mapped.record);
            if !report.is_valid() {
                debug!(
                    legacy_id = %mapped.legacy_id,
                    violations = report.len(),
                    "schema violation"
                );
                let transaction = TransactionResult::failure(
                    FailureKind::Permanent,
                    Some(mapped.legacy_id),
                    ReportEntry::new(SCHEMA_VIOLATION, report.summary()),
                    "record failed schema validation",
                    notes,
                );
                return RecordOutcome::new(transaction).with_unresolved(unresolved);
            }
        }

        let transaction = TransactionResult::success(
            mapped.record,
            Some(mapped.legacy_id),
            "mapped",
            notes,
        );
        RecordOutcome::new(transaction)
            .with_populated(mapped.populated)
            .with_unresolved(unresolved)
    }

    /// Like [`MigrationEngine::process`], for a reader item that may be an
    /// unreadable row. Those are permanent failures of their own.
    pub fn process_read(&self, item: Result<SourceRecord, IngestError>) -> RecordOutcome {
        match item {
            Ok(record) => self.process(record),
            Err(error) => {
                warn!(%error, "unreadable source record");
                RecordOutcome::new(TransactionResult::failure(
                    FailureKind::Permanent,
                    None,
                    ReportEntry::new(UNREADABLE_RECORD, error.to_string()),
                    "record not read",
                    Vec::new(),
                ))
            }
        }
    }

    /// Process records one at a time on the calling thread.
    pub fn run<I>(&self, records: I, sink: &mut RunSink) -> Result<()>
    where
        I: IntoIterator<Item = Result<SourceRecord, IngestError>>,
    {
        let _span = info_span!("migrate", object_type = %self.object_type(), workers = 1).entered();
        for item in records {
            let outcome = self.process_read(item);
            sink.accept(&outcome).context("write outcome")?;
        }
        info!(processed = sink.report().processed, "run complete");
        Ok(())
    }

    /// Process records on `workers` threads.
    ///
    /// The calling thread reads, workers map and validate, and one drain
    /// thread owns `sink`. Output order follows completion order.
    pub fn run_parallel<I>(&self, records: I, workers: usize, sink: &mut RunSink) -> Result<()>
    where
        I: IntoIterator<Item = Result<SourceRecord, IngestError>>,
    {
        let workers = workers.max(1);
        if workers == 1 {
            return self.run(records, sink);
        }
        let span = info_span!("migrate", object_type = %self.object_type(), workers);
        let _entered = span.enter();

        let (work_tx, work_rx) = bounded::<Result<SourceRecord, IngestError>>(
            workers * QUEUE_DEPTH_PER_WORKER,
        );
        let (done_tx, done_rx) = bounded::<RecordOutcome>(workers * QUEUE_DEPTH_PER_WORKER);

        let drain_sink = &mut *sink;
        let drained = thread::scope(|scope| {
            let drain = scope.spawn(move || drain_sink.drain(&done_rx));

            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let done_tx = done_tx.clone();
                let span = span.clone();
                scope.spawn(move || {
                    let _entered = span.enter();
                    for item in &work_rx {
                        if done_tx.send(self.process_read(item)).is_err() {
                            // Drain stopped; nothing more can be recorded.
                            break;
                        }
                    }
                });
            }
            drop(work_rx);
            drop(done_tx);

            for item in records {
                if work_tx.send(item).is_err() {
                    break;
                }
            }
            drop(work_tx);

            drain.join()
        });

        drained
            .map_err(|_| anyhow!("report drain thread panicked"))?
            .context("write outcome")?;
        info!(processed = sink.report().processed, "run complete");
        Ok(())
    }
}

fn keep_source_if_retried(outcome: RecordOutcome, record: SourceRecord) -> RecordOutcome {
    if outcome.transaction.should_be_retried() {
        outcome.with_source(record)
    } else {
        outcome
    }
}

/// Checks run-level inputs and loads reference data before any record is
/// mapped.
pub struct EngineBuilder {
    object_type: ObjectType,
    namespace: String,
    rules: Vec<MappingRule>,
    tables: Vec<String>,
    legacy_id_column: Option<String>,
    schema: Option<Arc<Value>>,
    schema_documents: SchemaDocuments,
}

impl EngineBuilder {
    pub fn new(object_type: ObjectType, namespace: impl Into<String>) -> Self {
        Self {
            object_type,
            namespace: namespace.into(),
            rules: Vec::new(),
            tables: Vec::new(),
            legacy_id_column: None,
            schema: None,
            schema_documents: SchemaDocuments::new(),
        }
    }

    pub fn rules(mut self, rules: Vec<MappingRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Tables to load beyond those the rules look up.
    pub fn reference_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.extend(tables.into_iter().map(Into::into));
        self
    }

    pub fn legacy_id_column(mut self, column: Option<String>) -> Self {
        self.legacy_id_column = column;
        self
    }

    pub fn schema(mut self, schema: Arc<Value>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Documents the schema's `$ref`s point into, by referenced name.
    pub fn schema_documents(mut self, documents: SchemaDocuments) -> Self {
        self.schema_documents = documents;
        self
    }

    pub fn build<R>(self, reference: &R) -> Result<MigrationEngine>
    where
        R: ReferenceDataSource + ?Sized,
    {
        let _span = info_span!("prepare", object_type = %self.object_type).entered();
        if self.namespace.trim().is_empty() {
            return Err(anyhow!("identifier namespace must not be empty"));
        }
        let rules = RuleSet::new(self.object_type, self.rules)
            .with_context(|| format!("rule set for {}", self.object_type))?;

        let mut tables: Vec<String> = rules
            .lookup_tables()
            .into_iter()
            .map(str::to_string)
            .collect();
        for table in self.tables {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        let mut resolver = ReferenceDataCache::new();
        resolver
            .load_from(reference, &tables)
            .context("load reference data")?;

        let mut mapper = RuleMapper::new(rules);
        if let Some(column) = &self.legacy_id_column {
            let profile = mapper.profile().clone().with_legacy_id_column(column);
            mapper = mapper.with_profile(profile);
        }
        let mut engine = MigrationEngine::new(
            Box::new(mapper),
            resolver,
            IdentifierGenerator::new(self.namespace),
        );
        if let Some(schema) = self.schema {
            let validator =
                SchemaValidator::with_documents(self.object_type, schema, self.schema_documents)
                    .with_context(|| format!("schema for {}", self.object_type))?;
            engine = engine.with_validator(validator);
        }
        info!(tables = tables.len(), "engine ready");
        Ok(engine)
    }
}
