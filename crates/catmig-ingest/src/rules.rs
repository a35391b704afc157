//! Mapping rule tables.
//!
//! A rule table is a delimited file with one rule per row. Header names
//! are matched case- and whitespace-insensitively. `target` and `source`
//! are required columns; `conditions`, `lookup`, `required`, `mandatory`,
//! `default` and `kind` are optional.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use catmig_model::rule::{parse_flag, parse_sources};
use catmig_model::{FieldPath, LookupRef, MappingRule, ValueKind, normalize_key, parse_conditions};

use crate::error::{IngestError, Result};

const TARGET_COLUMNS: &[&str] = &["target", "target field", "target_field"];
const SOURCE_COLUMNS: &[&str] = &["source", "source field", "source_field", "legacy field"];

/// Load a rule table; `.tsv` files are tab-separated, anything else is CSV.
pub fn load_rule_table(path: &Path) -> Result<Vec<MappingRule>> {
    let file = File::open(path).map_err(|error| IngestError::io(path, error))?;
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    parse_rule_table(file, delimiter, path)
}

/// Parse a rule table from any reader; `label` names it in errors.
pub fn parse_rule_table<R: Read>(
    reader: R,
    delimiter: u8,
    label: impl Into<PathBuf>,
) -> Result<Vec<MappingRule>> {
    let path = label.into();
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|error| IngestError::parse(&path, 1, error.to_string()))?;
    let mut columns: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, header) in headers.iter().enumerate() {
        columns
            .entry(normalize_key(header.trim_start_matches('\u{feff}')))
            .or_insert(idx);
    }
    let column = |aliases: &[&str]| aliases.iter().find_map(|alias| columns.get(*alias).copied());

    let target_idx = column(TARGET_COLUMNS).ok_or_else(|| IngestError::MissingColumn {
        path: path.clone(),
        column: "target".to_string(),
    })?;
    let source_idx = column(SOURCE_COLUMNS).ok_or_else(|| IngestError::MissingColumn {
        path: path.clone(),
        column: "source".to_string(),
    })?;
    let layout = RuleColumns {
        target: target_idx,
        source: source_idx,
        conditions: column(&["conditions", "condition", "values"]),
        lookup: column(&["lookup", "lookup table", "reference"]),
        required: column(&["required"]),
        mandatory: column(&["mandatory", "mandatory lookup"]),
        default: column(&["default"]),
        kind: column(&["kind", "type"]),
    };

    let mut rules = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(|error| {
            let line = error.position().map_or(0, |position| position.line() as usize);
            IngestError::parse(&path, line, error.to_string())
        })?;
        let line = row.position().map_or(0, |position| position.line() as usize);
        let cell = |idx: Option<usize>| idx.and_then(|idx| row.get(idx)).unwrap_or("").trim();
        let invalid = |message: String| IngestError::InvalidRule {
            path: path.clone(),
            line,
            message,
        };

        let target = cell(Some(layout.target));
        let source = cell(Some(layout.source));
        let conditions = cell(layout.conditions);
        let default = cell(layout.default);
        if target.is_empty() || target.starts_with('#') {
            continue;
        }
        if source.is_empty() && conditions.is_empty() && default.is_empty() {
            debug!(target = %target, line, "skipping rule without source, conditions or default");
            continue;
        }

        let rule = MappingRule {
            target: FieldPath::parse(target).map_err(|error| invalid(error.to_string()))?,
            sources: parse_sources(source),
            conditions: parse_conditions(conditions).map_err(|error| invalid(error.to_string()))?,
            lookup: LookupRef::parse(cell(layout.lookup))
                .map_err(|error| invalid(error.to_string()))?,
            required: parse_flag(cell(layout.required))
                .map_err(|error| invalid(error.to_string()))?,
            mandatory: parse_flag(cell(layout.mandatory))
                .map_err(|error| invalid(error.to_string()))?,
            default: (!default.is_empty()).then(|| catmig_model::ValueExpr::parse(default)),
            kind: ValueKind::parse(cell(layout.kind)).map_err(|error| invalid(error.to_string()))?,
            line: Some(line),
        };
        rules.push(rule);
    }

    debug!(path = %path.display(), rules = rules.len(), "loaded rule table");
    Ok(rules)
}

struct RuleColumns {
    target: usize,
    source: usize,
    conditions: Option<usize>,
    lookup: Option<usize>,
    required: Option<usize>,
    mandatory: Option<usize>,
    default: Option<usize>,
    kind: Option<usize>,
}
