//! The single accumulation point of a run.
//!
//! Every outcome goes through one [`RunSink`], which owns the report and
//! the writers. Parallel runs feed it through a channel drained by one
//! thread, so counts and output order are decided in one place.

use std::io::Write;

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::error::Result;
use crate::outcome::RecordOutcome;
use crate::report::MigrationReport;
use crate::retry::RetryWriter;
use crate::writer::RecordWriter;

type BoxedWrite = Box<dyn Write + Send>;

pub struct RunSink {
    report: MigrationReport,
    records: Option<RecordWriter<BoxedWrite>>,
    retries: Option<RetryWriter<BoxedWrite>>,
}

impl RunSink {
    pub fn new(report: MigrationReport) -> Self {
        Self {
            report,
            records: None,
            retries: None,
        }
    }

    pub fn with_records(mut self, writer: RecordWriter<BoxedWrite>) -> Self {
        self.records = Some(writer);
        self
    }

    pub fn with_retries(mut self, writer: RetryWriter<BoxedWrite>) -> Self {
        self.retries = Some(writer);
        self
    }

    pub fn report(&self) -> &MigrationReport {
        &self.report
    }

    /// Count the outcome and write its record or retry entry.
    ///
    /// An output error is returned after the outcome has been counted.
    pub fn accept(&mut self, outcome: &RecordOutcome) -> Result<()> {
        self.report.record(outcome);
        if let Some(record) = outcome.transaction.result()
            && let Some(writer) = &mut self.records
        {
            writer.write(record)?;
        }
        if let Some(writer) = &mut self.retries
            && writer.write(outcome)?
        {
            debug!(legacy_id = ?outcome.transaction.legacy_id(), "queued for retry");
        }
        Ok(())
    }

    /// Accept outcomes until every sender is gone.
    ///
    /// Stops at the first output error; senders then see a closed channel.
    pub fn drain(&mut self, outcomes: &Receiver<RecordOutcome>) -> Result<()> {
        for outcome in outcomes {
            if let Err(error) = self.accept(&outcome) {
                warn!(%error, "output failed; stopping the run");
                return Err(error);
            }
        }
        Ok(())
    }

    /// Flush the writers and stamp the finish time.
    pub fn finish(mut self) -> Result<MigrationReport> {
        if let Some(writer) = &mut self.records {
            writer.flush()?;
        }
        if let Some(writer) = &mut self.retries {
            writer.flush()?;
        }
        self.report.finish();
        Ok(self.report)
    }
}

impl std::fmt::Debug for RunSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunSink")
            .field("processed", &self.report.processed)
            .field("records", &self.records.is_some())
            .field("retries", &self.retries.is_some())
            .finish()
    }
}
