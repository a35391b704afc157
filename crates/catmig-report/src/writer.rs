//! Output record stream.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use catmig_model::TargetRecord;

use crate::error::{ReportError, Result};

/// Line format of the output stream, chosen by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// `<json>\n`
    #[default]
    JsonLines,
    /// `<id>\t<json>\n`, for bulk loading.
    BulkLoad,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonLines => "json-lines",
            Self::BulkLoad => "bulk-load",
        }
    }

    /// One output line for `record`, newline included.
    pub fn format(&self, record: &TargetRecord) -> Result<String> {
        let json = serde_json::to_string(record)?;
        match self {
            Self::JsonLines => Ok(format!("{json}\n")),
            Self::BulkLoad => {
                let id = record.id().ok_or(ReportError::MissingIdentifier)?;
                Ok(format!("{id}\t{json}\n"))
            }
        }
    }
}

impl FromStr for OutputMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "json-lines" | "jsonl" | "json" => Ok(Self::JsonLines),
            "bulk-load" | "bulk" | "tsv" => Ok(Self::BulkLoad),
            other => Err(ReportError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes successfully transformed records, one per line.
pub struct RecordWriter<W: Write> {
    inner: W,
    mode: OutputMode,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W, mode: OutputMode) -> Self {
        Self {
            inner,
            mode,
            written: 0,
        }
    }

    pub fn write(&mut self, record: &TargetRecord) -> Result<()> {
        let line = self.mode.format(record)?;
        self.inner.write_all(line.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
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
