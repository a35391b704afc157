//! Shared delimited-file helpers for reference tables.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Result, StandardsError};

/// Read a delimited file into row maps keyed by normalized header.
///
/// Headers are trimmed, lower-cased and stripped of a byte-order mark;
/// values are trimmed.
pub fn read_delimited_rows(path: &Path, delimiter: u8) -> Result<Vec<BTreeMap<String, String>>> {
    let csv_error = |error: csv::Error| StandardsError::Csv {
        path: path.to_path_buf(),
        message: error.to_string(),
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(csv_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let mut row = BTreeMap::new();
        for (idx, value) in record.iter().enumerate() {
            let Some(key) = headers.get(idx) else {
                continue;
            };
            row.entry(key.clone())
                .or_insert_with(|| value.trim().to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

/// First non-empty value among the given column aliases.
pub fn get_any<'a>(row: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// Whether any of the aliases is a column of the file.
pub fn has_any(headers: &BTreeMap<String, String>, keys: &[&str]) -> bool {
    keys.iter().any(|key| headers.contains_key(*key))
}
