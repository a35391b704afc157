//! Streaming readers for legacy record files.
//!
//! Delimited files (CSV, TSV) yield one flat record per row; JSON lines
//! files yield one record per line and keep nested structure (bibliographic
//! fields with subfields). Header names are normalized by
//! [`SourceRecord`], values are passed through untouched apart from a
//! leading byte-order mark on the first header.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};
use serde::{Deserialize, Serialize};
use tracing::warn;

use catmig_model::SourceRecord;

use crate::error::{IngestError, Result};

/// Layout of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Tsv,
    JsonLines,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" | "txt" => Some(Self::Tsv),
            "jsonl" | "ndjson" | "json" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

enum Inner {
    Delimited {
        headers: Vec<String>,
        rows: StringRecordsIntoIter<Box<dyn Read>>,
    },
    JsonLines(Lines<BufReader<Box<dyn Read>>>),
}

/// Iterator over the records of one source file.
///
/// A row that cannot be parsed yields an `Err` item and reading continues
/// with the next row.
pub struct RecordReader {
    inner: Inner,
    path: PathBuf,
    line: usize,
}

impl RecordReader {
    pub fn open(path: &Path, format: SourceFormat) -> Result<Self> {
        let file = File::open(path).map_err(|error| IngestError::io(path, error))?;
        Self::from_reader(Box::new(file), format, path)
    }

    /// Read from any byte source; `label` names it in errors.
    pub fn from_reader(
        reader: Box<dyn Read>,
        format: SourceFormat,
        label: impl Into<PathBuf>,
    ) -> Result<Self> {
        let path = label.into();
        // Delimited files start below their header line.
        let line = match format {
            SourceFormat::JsonLines => 0,
            SourceFormat::Csv | SourceFormat::Tsv => 1,
        };
        let inner = match format {
            SourceFormat::Csv => Self::delimited(reader, b',', true, &path)?,
            SourceFormat::Tsv => Self::delimited(reader, b'\t', false, &path)?,
            SourceFormat::JsonLines => Inner::JsonLines(BufReader::new(reader).lines()),
        };
        Ok(Self { inner, path, line })
    }

    fn delimited(
        reader: Box<dyn Read>,
        delimiter: u8,
        quoting: bool,
        path: &Path,
    ) -> Result<Inner> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .quoting(quoting)
            .from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|error| IngestError::parse(path, 1, error.to_string()))?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').to_string())
            .collect();
        warn_on_duplicate_headers(path, &headers);
        Ok(Inner::Delimited {
            headers,
            rows: csv_reader.into_records(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line of the most recently returned record.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl Iterator for RecordReader {
    type Item = Result<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Delimited { headers, rows } => {
                let row = rows.next()?;
                self.line += 1;
                let row = match row {
                    Ok(row) => row,
                    Err(error) => {
                        let line = error
                            .position()
                            .map_or(self.line, |position| position.line() as usize);
                        return Some(Err(IngestError::parse(&self.path, line, error.to_string())));
                    }
                };
                if let Some(position) = row.position() {
                    self.line = position.line() as usize;
                }
                let pairs = headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, value)| (header.as_str(), value.to_string()));
                Some(Ok(SourceRecord::from_row(pairs)))
            }
            Inner::JsonLines(lines) => loop {
                let line = lines.next()?;
                self.line += 1;
                let line = match line {
                    Ok(line) => line,
                    Err(error) => return Some(Err(IngestError::io(&self.path, error))),
                };
                if line.trim().is_empty() {
                    continue;
                }
                let line_no = self.line;
                let parsed = serde_json::from_str::<serde_json::Value>(&line)
                    .map_err(|error| error.to_string())
                    .and_then(|value| {
                        SourceRecord::from_json_reporting_duplicates(&value)
                            .map_err(|error| error.to_string())
                    })
                    .map(|(record, duplicates)| {
                        for key in &duplicates {
                            warn!(
                                path = %self.path.display(),
                                line = line_no,
                                key = %key,
                                "duplicate key after normalization; the first occurrence is used"
                            );
                        }
                        record
                    });
                return Some(
                    parsed.map_err(|message| IngestError::parse(&self.path, line_no, message)),
                );
            },
        }
    }
}

fn warn_on_duplicate_headers(path: &Path, headers: &[String]) {
    let mut seen = std::collections::BTreeSet::new();
    for header in headers {
        if !seen.insert(catmig_model::normalize_key(header)) {
            warn!(
                path = %path.display(),
                column = %header,
                "duplicate column after normalization; the first occurrence is used"
            );
        }
    }
}

/// Open a delimited file with an arbitrary single-byte delimiter.
///
/// Tab-delimited files are read without quote handling, since legacy
/// exports carry literal quotes in titles.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<RecordReader> {
    let file = File::open(path).map_err(|error| IngestError::io(path, error))?;
    let inner = RecordReader::delimited(Box::new(file), delimiter, delimiter != b'\t', path)?;
    Ok(RecordReader {
        inner,
        path: path.to_path_buf(),
        line: 1,
    })
}

/// Open a JSON lines file of nested records.
pub fn read_json_lines(path: &Path) -> Result<RecordReader> {
    RecordReader::open(path, SourceFormat::JsonLines)
}

/// Read every record of a file, failing on the first unreadable row.
pub fn read_records(path: &Path, format: SourceFormat) -> Result<Vec<SourceRecord>> {
    RecordReader::open(path, format)?.collect()
}
