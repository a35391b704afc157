//! Where reference tables come from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::csv_utils::{get_any, has_any, read_delimited_rows};
use crate::error::{Result, StandardsError};
use crate::reference::ReferenceRow;

const CODE_COLUMNS: &[&str] = &["code", "legacy_code", "legacy code"];
const ID_COLUMNS: &[&str] = &["id", "target_id", "target id"];
const NAME_COLUMNS: &[&str] = &["name", "display", "label"];

/// Supplier of reference table rows.
///
/// Fetching is the only operation that may touch the network or disk; it
/// happens once per table before any record is processed.
pub trait ReferenceDataSource: Send + Sync {
    fn fetch(&self, table: &str) -> Result<Vec<ReferenceRow>>;
}

/// Reads `<table>.tsv`, `<table>.csv` or `<table>.json` from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryReferenceSource {
    root: PathBuf,
}

impl DirectoryReferenceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, table: &str) -> Option<PathBuf> {
        ["tsv", "csv", "json"]
            .iter()
            .map(|extension| self.root.join(format!("{table}.{extension}")))
            .find(|path| path.is_file())
    }
}

impl ReferenceDataSource for DirectoryReferenceSource {
    fn fetch(&self, table: &str) -> Result<Vec<ReferenceRow>> {
        let Some(path) = self.locate(table) else {
            return Err(StandardsError::TableUnavailable {
                table: table.to_string(),
                message: format!("no {table}.tsv, .csv or .json in {}", self.root.display()),
            });
        };
        debug!(table, path = %path.display(), "reading reference table");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => read_json_rows(&path),
            Some("tsv") => read_table_rows(&path, b'\t'),
            _ => read_table_rows(&path, b','),
        }
    }
}

fn read_table_rows(path: &Path, delimiter: u8) -> Result<Vec<ReferenceRow>> {
    let rows = read_delimited_rows(path, delimiter)?;
    if let Some(first) = rows.first() {
        for (column, aliases) in [("code", CODE_COLUMNS), ("id", ID_COLUMNS)] {
            if !has_any(first, aliases) {
                return Err(StandardsError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }
    }
    Ok(rows.iter().filter_map(row_from_columns).collect())
}

fn row_from_columns(row: &BTreeMap<String, String>) -> Option<ReferenceRow> {
    let code = get_any(row, CODE_COLUMNS)?;
    let id = get_any(row, ID_COLUMNS).unwrap_or_default();
    let name = get_any(row, NAME_COLUMNS).unwrap_or_default();
    Some(ReferenceRow::new(code, id, name))
}

/// Accepts a bare array of objects or an object wrapping exactly one array.
fn read_json_rows(path: &Path) -> Result<Vec<ReferenceRow>> {
    let text = std::fs::read_to_string(path).map_err(|error| StandardsError::io(path, error))?;
    let json_error = |message: String| StandardsError::Json {
        path: path.to_path_buf(),
        message,
    };
    let value: Value = serde_json::from_str(&text).map_err(|error| json_error(error.to_string()))?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut arrays = map.values().filter_map(Value::as_array);
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => items,
                _ => return Err(json_error("expected an object wrapping one array".to_string())),
            }
        }
        _ => return Err(json_error("expected an array of rows".to_string())),
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Some(object) = item.as_object() else {
            return Err(json_error("every row must be an object".to_string()));
        };
        let columns: BTreeMap<String, String> = object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(text) => text.trim().to_string(),
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    _ => return None,
                };
                Some((key.trim().to_lowercase(), text))
            })
            .collect();
        if let Some(row) = row_from_columns(&columns) {
            rows.push(row);
        }
    }
    Ok(rows)
}
