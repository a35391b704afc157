//! Controlled-vocabulary lookups.
//!
//! Tables are loaded up front and never changed afterwards; reloading a
//! table builds a new one and swaps it in whole. Codes are compared after
//! trimming and lower-casing, both on load and on resolve.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, StandardsError};
use crate::hash::table_fingerprint;
use crate::source::ReferenceDataSource;

/// Code of the row used for otherwise unmatched codes.
pub const FALLBACK_CODE: &str = "*";

/// One row of a reference table as delivered by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub code: String,
    pub id: String,
    pub name: String,
}

impl ReferenceRow {
    pub fn new(code: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Target side of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    pub id: String,
    pub name: String,
}

/// Why a lookup found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// The table was never loaded; retrying after loading it can succeed.
    TableNotLoaded { table: String },
    UnknownCode { table: String, code: String },
    EmptyCode { table: String },
}

impl Unresolved {
    /// A gap that a later pass may close without changing the source data.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TableNotLoaded { .. })
    }

    pub fn table(&self) -> &str {
        match self {
            Self::TableNotLoaded { table }
            | Self::UnknownCode { table, .. }
            | Self::EmptyCode { table } => table,
        }
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableNotLoaded { table } => write!(f, "reference table '{table}' is not loaded"),
            Self::UnknownCode { table, code } => {
                write!(f, "code '{code}' not found in '{table}'")
            }
            Self::EmptyCode { table } => write!(f, "empty code for '{table}'"),
        }
    }
}

/// Result of one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a RefEntry),
    /// The code is unknown; the table's `*` row was used.
    Fallback(&'a RefEntry),
    Unresolved(Unresolved),
}

impl<'a> Resolution<'a> {
    pub fn entry(&self) -> Option<&'a RefEntry> {
        match self {
            Self::Found(entry) | Self::Fallback(entry) => Some(entry),
            Self::Unresolved(_) => None,
        }
    }
}

/// One loaded vocabulary.
#[derive(Debug, Clone)]
pub struct LookupTable {
    name: String,
    entries: HashMap<String, RefEntry>,
    fallback: Option<RefEntry>,
    fingerprint: String,
}

impl LookupTable {
    /// Build a table; a code listed twice is an error.
    pub fn build(name: &str, rows: &[ReferenceRow]) -> Result<Self> {
        let name = normalize_code(name);
        let mut entries = HashMap::with_capacity(rows.len());
        let mut fallback = None;
        for row in rows {
            let code = normalize_code(&row.code);
            let entry = RefEntry {
                id: row.id.trim().to_string(),
                name: row.name.trim().to_string(),
            };
            if code == FALLBACK_CODE {
                if fallback.replace(entry).is_some() {
                    return Err(StandardsError::DuplicateCode {
                        table: name,
                        code: FALLBACK_CODE.to_string(),
                    });
                }
                continue;
            }
            if code.is_empty() {
                continue;
            }
            if entries.insert(code.clone(), entry).is_some() {
                return Err(StandardsError::DuplicateCode { table: name, code });
            }
        }
        let fingerprint = table_fingerprint(
            rows.iter()
                .map(|row| (row.code.trim(), row.id.trim(), row.name.trim())),
        );
        Ok(Self {
            name,
            entries,
            fallback,
            fingerprint,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn resolve(&self, code: &str) -> Resolution<'_> {
        let key = normalize_code(code);
        if key.is_empty() {
            return Resolution::Unresolved(Unresolved::EmptyCode {
                table: self.name.clone(),
            });
        }
        if let Some(entry) = self.entries.get(&key) {
            return Resolution::Found(entry);
        }
        match &self.fallback {
            Some(entry) => Resolution::Fallback(entry),
            None => Resolution::Unresolved(Unresolved::UnknownCode {
                table: self.name.clone(),
                code: code.trim().to_string(),
            }),
        }
    }
}

/// Summary of a loaded table, for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub entries: usize,
    pub has_fallback: bool,
    pub fingerprint: String,
}

/// Cache of every reference table of a run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataCache {
    tables: HashMap<String, Arc<LookupTable>>,
}

impl ReferenceDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load or replace one table. The previous version stays untouched for
    /// anyone holding it until the new one is complete.
    pub fn load(&mut self, table_name: &str, rows: &[ReferenceRow]) -> Result<()> {
        let table = LookupTable::build(table_name, rows)?;
        debug!(
            table = %table.name(),
            entries = table.len(),
            fallback = table.has_fallback(),
            "loaded reference table"
        );
        self.tables.insert(table.name().to_string(), Arc::new(table));
        Ok(())
    }

    /// Load the named tables from a source. Any table that cannot be
    /// fetched fails the whole load.
    pub fn load_from<S, I, N>(&mut self, source: &S, table_names: I) -> Result<()>
    where
        S: ReferenceDataSource + ?Sized,
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut loaded = 0usize;
        for name in table_names {
            let name = name.as_ref();
            let rows = source.fetch(name)?;
            self.load(name, &rows)?;
            loaded += 1;
        }
        info!(tables = loaded, "reference data loaded");
        Ok(())
    }

    pub fn resolve(&self, table_name: &str, legacy_code: &str) -> Resolution<'_> {
        match self.tables.get(&normalize_code(table_name)) {
            Some(table) => table.resolve(legacy_code),
            None => Resolution::Unresolved(Unresolved::TableNotLoaded {
                table: normalize_code(table_name),
            }),
        }
    }

    pub fn table(&self, table_name: &str) -> Option<Arc<LookupTable>> {
        self.tables.get(&normalize_code(table_name)).cloned()
    }

    pub fn contains_table(&self, table_name: &str) -> bool {
        self.tables.contains_key(&normalize_code(table_name))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Loaded tables in name order.
    pub fn summaries(&self) -> Vec<TableSummary> {
        let ordered: BTreeMap<&str, &Arc<LookupTable>> = self
            .tables
            .iter()
            .map(|(name, table)| (name.as_str(), table))
            .collect();
        ordered
            .into_values()
            .map(|table| TableSummary {
                name: table.name().to_string(),
                entries: table.len(),
                has_fallback: table.has_fallback(),
                fingerprint: table.fingerprint().to_string(),
            })
            .collect()
    }
}

fn normalize_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material_types() -> Vec<ReferenceRow> {
        vec![
            ReferenceRow::new("book", "mt-1", "Book"),
            ReferenceRow::new("DVD", "mt-2", "Video"),
        ]
    }

    #[test]
    fn codes_resolve_case_and_whitespace_insensitively() {
        let mut cache = ReferenceDataCache::new();
        cache.load("material_type", &material_types()).unwrap();
        let upper = cache.resolve("material_type", "BOOK");
        let padded = cache.resolve("Material_Type", " book ");
        assert_eq!(upper, padded);
        assert_eq!(upper.entry().map(|entry| entry.id.as_str()), Some("mt-1"));
        assert_eq!(
            cache.resolve("material_type", "dvd").entry().map(|e| e.name.as_str()),
            Some("Video")
        );
    }

    #[test]
    fn misses_are_tagged_never_errors() {
        let mut cache = ReferenceDataCache::new();
        cache.load("material_type", &material_types()).unwrap();
        assert_eq!(
            cache.resolve("material_type", "unknown"),
            Resolution::Unresolved(Unresolved::UnknownCode {
                table: "material_type".to_string(),
                code: "unknown".to_string(),
            })
        );
        let missing_table = cache.resolve("locations", "main");
        match missing_table {
            Resolution::Unresolved(reason) => assert!(reason.is_transient()),
            other => panic!("expected unresolved, got {other:?}"),
        }
        assert!(matches!(
            cache.resolve("material_type", "  "),
            Resolution::Unresolved(Unresolved::EmptyCode { .. })
        ));
    }

    #[test]
    fn fallback_row_catches_unknown_codes() {
        let mut rows = material_types();
        rows.push(ReferenceRow::new("*", "mt-9", "Other"));
        let mut cache = ReferenceDataCache::new();
        cache.load("material_type", &rows).unwrap();
        assert!(matches!(
            cache.resolve("material_type", "vinyl"),
            Resolution::Fallback(RefEntry { id, .. }) if id == "mt-9"
        ));
        assert!(matches!(
            cache.resolve("material_type", "book"),
            Resolution::Found(_)
        ));
    }

    #[test]
    fn duplicate_codes_fail_the_load() {
        let rows = vec![
            ReferenceRow::new("book", "mt-1", "Book"),
            ReferenceRow::new(" BOOK", "mt-3", "Book again"),
        ];
        let mut cache = ReferenceDataCache::new();
        let err = cache.load("material_type", &rows).unwrap_err();
        assert!(matches!(err, StandardsError::DuplicateCode { .. }));
        assert!(!cache.contains_table("material_type"));
    }

    #[test]
    fn reload_replaces_table_and_leaves_old_handles_intact() {
        let mut cache = ReferenceDataCache::new();
        cache.load("material_type", &material_types()).unwrap();
        let old = cache.table("material_type").unwrap();
        cache
            .load("material_type", &[ReferenceRow::new("book", "mt-100", "Book")])
            .unwrap();
        assert_eq!(
            cache.resolve("material_type", "book").entry().unwrap().id,
            "mt-100"
        );
        assert!(matches!(
            cache.resolve("material_type", "dvd"),
            Resolution::Unresolved(_)
        ));
        assert_eq!(old.resolve("dvd").entry().unwrap().id, "mt-2");
    }

    #[test]
    fn fingerprint_ignores_row_order() {
        let mut reversed = material_types();
        reversed.reverse();
        let a = LookupTable::build("t", &material_types()).unwrap();
        let b = LookupTable::build("t", &reversed).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
