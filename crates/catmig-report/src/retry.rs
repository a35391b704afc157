//! Retry queue: source records of retryable failures as JSON lines.

use std::io::Write;

use serde_json::json;

use crate::error::Result;
use crate::outcome::RecordOutcome;

pub struct RetryWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> RetryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Queue the outcome if it should be retried; returns whether it was.
    pub fn write(&mut self, outcome: &RecordOutcome) -> Result<bool> {
        let transaction = &outcome.transaction;
        if !transaction.should_be_retried() {
            return Ok(false);
        }
        let entry = json!({
            "legacy_id": transaction.legacy_id(),
            "category": transaction.failure_category(),
            "error": transaction.error_message(),
            "record": outcome.source.as_ref().map(|source| source.to_json()),
        });
        serde_json::to_writer(&mut self.inner, &entry)?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(true)
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
