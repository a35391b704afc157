//! Tabular mapping rules.
//!
//! One rule populates one target field. The textual forms accepted here are
//! the cell formats of a rule table:
//!
//! | column       | example                                   |
//! |--------------|-------------------------------------------|
//! | `target`     | `notes[0].note`                           |
//! | `source`     | `245.a + 245.b`                           |
//! | `conditions` | `~^b => Book; dvd => Video; * => Other`   |
//! | `lookup`     | `material_types` or `@instance`           |
//! | `required`   | `yes`                                     |
//! | `mandatory`  | `no`                                      |
//! | `default`    | `<empty>`                                 |
//! | `kind`       | `boolean`                                 |
//!
//! In `conditions` and `default`, double quotes protect text that would
//! otherwise be read as syntax: `"a; b"`, `~"^x=>y$"`, `"empty"`. A quote
//! inside a quoted part is written twice (`"say ""hi"""`). Keywords
//! (`empty`, `present`, `$value`, `<empty>`, ...) ignore case.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::source::normalize_key;
use crate::target::FieldPath;
use crate::{ModelError, ObjectType, Result};

/// Token for an explicit empty string in `conditions` and `default`.
pub const EMPTY_TOKEN: &str = "<empty>";

/// When a condition/value entry applies.
#[derive(Debug, Clone)]
pub enum Condition {
    /// `*`
    Always,
    /// `empty`: the extracted value is blank.
    Empty,
    /// `present`: the extracted value is not blank.
    Present,
    /// Literal, compared trimmed and case-insensitively.
    Equals(String),
    /// `!literal`
    NotEquals(String),
    /// `~regex`
    Matches(Regex),
}

impl Condition {
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();
        if let Some(literal) = unquote(text) {
            return Ok(Self::Equals(fold(&literal)));
        }
        let condition = match text.to_lowercase().as_str() {
            "*" => Self::Always,
            "empty" => Self::Empty,
            "present" => Self::Present,
            _ => {
                if let Some(pattern) = text.strip_prefix('~') {
                    let pattern = pattern.trim();
                    let pattern = unquote(pattern).unwrap_or_else(|| pattern.to_string());
                    let regex = Regex::new(&pattern).map_err(|error| {
                        ModelError::InvalidRule(format!("bad pattern '{pattern}': {error}"))
                    })?;
                    Self::Matches(regex)
                } else if let Some(literal) = text.strip_prefix('!') {
                    Self::NotEquals(normalize_literal(literal))
                } else {
                    Self::Equals(normalize_literal(text))
                }
            }
        };
        Ok(condition)
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Empty => value.trim().is_empty(),
            Self::Present => !value.trim().is_empty(),
            Self::Equals(expected) => fold(value) == *expected,
            Self::NotEquals(expected) => fold(value) != *expected,
            Self::Matches(regex) => regex.is_match(value),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Always, Self::Always)
            | (Self::Empty, Self::Empty)
            | (Self::Present, Self::Present) => true,
            (Self::Equals(a), Self::Equals(b)) | (Self::NotEquals(a), Self::NotEquals(b)) => a == b,
            (Self::Matches(a), Self::Matches(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("*"),
            Self::Empty => f.write_str("empty"),
            Self::Present => f.write_str("present"),
            Self::Equals(value) => {
                let keyword = matches!(value.as_str(), "*" | "empty" | "present")
                    || value.starts_with(['~', '!']);
                if keyword || needs_quotes(value) {
                    f.write_str(&quote(value))
                } else {
                    f.write_str(value)
                }
            }
            Self::NotEquals(value) => write!(f, "!{}", quote_if_needed(value)),
            Self::Matches(regex) => write!(f, "~{}", quote_if_needed(regex.as_str())),
        }
    }
}

/// A literal as conditions compare it: quotes removed, trimmed, lower-case.
fn normalize_literal(raw: &str) -> String {
    let trimmed = raw.trim();
    match unquote(trimmed) {
        Some(inner) => fold(&inner),
        None => fold(trimmed),
    }
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Inner text of a `"..."` part, with doubled quotes collapsed. `None`
/// when `text` is not a single quoted part.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut chars = inner.chars().peekable();
    let mut out = String::with_capacity(inner.len());
    while let Some(c) = chars.next() {
        if c == '"' {
            // Only a doubled quote may appear inside.
            if chars.next() != Some('"') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

fn needs_quotes(text: &str) -> bool {
    text.contains([';', '"']) || text.contains("=>") || text.trim() != text
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn quote_if_needed(text: &str) -> String {
    if needs_quotes(text) {
        quote(text)
    } else {
        text.to_string()
    }
}

/// Split on `separator` wherever it is outside double quotes.
fn split_unquoted<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(pos) = find_unquoted(rest, separator) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + separator.len()..];
    }
    parts.push(rest);
    parts
}

fn find_unquoted(text: &str, separator: &str) -> Option<usize> {
    let mut quoted = false;
    for (pos, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && text[pos..].starts_with(separator) {
            return Some(pos);
        }
    }
    None
}

/// What a matching entry writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    /// `$value`: the extracted value, after lookup if any.
    Value,
    /// `$name`: the display value of the resolved lookup entry.
    Name,
    /// `$source`: the extracted value before lookup.
    Source,
    /// `<empty>`
    Empty,
    Literal(String),
}

impl ValueExpr {
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        if let Some(literal) = unquote(text) {
            return Self::Literal(literal);
        }
        match text.to_lowercase().as_str() {
            "$value" => Self::Value,
            "$name" => Self::Name,
            "$source" => Self::Source,
            EMPTY_TOKEN => Self::Empty,
            _ => Self::Literal(text.to_string()),
        }
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("$value"),
            Self::Name => f.write_str("$name"),
            Self::Source => f.write_str("$source"),
            Self::Empty => f.write_str(EMPTY_TOKEN),
            Self::Literal(text) => {
                let lower = text.to_lowercase();
                let keyword = lower.starts_with('$') || lower == EMPTY_TOKEN;
                if keyword || needs_quotes(text) {
                    f.write_str(&quote(text))
                } else {
                    f.write_str(text)
                }
            }
        }
    }
}

/// One `condition => value` entry of a rule's table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEntry {
    pub condition: Condition,
    pub value: ValueExpr,
}

impl ConditionEntry {
    pub fn new(condition: Condition, value: ValueExpr) -> Self {
        Self { condition, value }
    }
}

/// Parse a `conditions` cell. A blank cell copies any present value.
pub fn parse_conditions(cell: &str) -> Result<Vec<ConditionEntry>> {
    if cell.trim().is_empty() {
        return Ok(vec![ConditionEntry::new(Condition::Present, ValueExpr::Value)]);
    }
    let mut entries = Vec::new();
    for part in split_unquoted(cell, ";") {
        if part.trim().is_empty() {
            continue;
        }
        let Some(arrow) = find_unquoted(part, "=>") else {
            return Err(ModelError::InvalidRule(format!(
                "condition entry '{}' is missing '=>'",
                part.trim()
            )));
        };
        let (condition, value) = (&part[..arrow], &part[arrow + 2..]);
        entries.push(ConditionEntry::new(
            Condition::parse(condition)?,
            ValueExpr::parse(value),
        ));
    }
    Ok(entries)
}

/// JSON type written for a rule's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    /// Append the value to an array.
    Array,
    /// Split the value on `|` and append each part.
    List,
}

impl ValueKind {
    pub fn parse(raw: &str) -> Result<Self> {
        let kind = match raw.trim().to_lowercase().as_str() {
            "" | "string" | "text" => Self::String,
            "integer" | "int" => Self::Integer,
            "number" | "decimal" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "array" => Self::Array,
            "list" => Self::List,
            other => {
                return Err(ModelError::InvalidRule(format!("unknown kind '{other}'")));
            }
        };
        Ok(kind)
    }

    pub fn appends(&self) -> bool {
        matches!(self, Self::Array | Self::List)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::List => "list",
        })
    }
}

/// Reference data behind a rule's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupRef {
    /// A reference data table, by name.
    Table(String),
    /// `@type`: the identifier generated for that legacy id and object type.
    Identifier(ObjectType),
}

impl LookupRef {
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let text = raw.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if let Some(object_type) = text.strip_prefix('@') {
            let object_type = ObjectType::parse(object_type)
                .map_err(|error| ModelError::InvalidRule(error.to_string()))?;
            return Ok(Some(Self::Identifier(object_type)));
        }
        Ok(Some(Self::Table(normalize_key(text))))
    }
}

impl fmt::Display for LookupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(name) => f.write_str(name),
            Self::Identifier(object_type) => write!(f, "@{object_type}"),
        }
    }
}

/// How to populate one target field.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRule {
    pub target: FieldPath,
    /// Normalized source references; several are joined with a space.
    pub sources: Vec<String>,
    pub conditions: Vec<ConditionEntry>,
    pub lookup: Option<LookupRef>,
    /// The source value must be present.
    pub required: bool,
    /// An unresolved lookup fails the record instead of warning.
    pub mandatory: bool,
    /// Written when no condition matches.
    pub default: Option<ValueExpr>,
    pub kind: ValueKind,
    /// Row of the rule table this rule came from, when known.
    pub line: Option<usize>,
}

impl MappingRule {
    /// A plain copy rule from `source` to `target`.
    pub fn new(target: &str, source: &str) -> Result<Self> {
        Ok(Self {
            target: FieldPath::parse(target)?,
            sources: parse_sources(source),
            conditions: parse_conditions("")?,
            lookup: None,
            required: false,
            mandatory: false,
            default: None,
            kind: ValueKind::default(),
            line: None,
        })
    }

    pub fn with_conditions(mut self, cell: &str) -> Result<Self> {
        self.conditions = parse_conditions(cell)?;
        Ok(self)
    }

    pub fn with_lookup(mut self, cell: &str) -> Result<Self> {
        self.lookup = LookupRef::parse(cell)?;
        Ok(self)
    }

    pub fn with_default(mut self, cell: &str) -> Self {
        self.default = Some(ValueExpr::parse(cell));
        self
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Human-readable label for messages: `title <- title (line 3)`.
    pub fn describe(&self) -> String {
        let mut text = format!("{} <- {}", self.target, self.sources.join(" + "));
        if let Some(line) = self.line {
            text.push_str(&format!(" (line {line})"));
        }
        text
    }
}

/// Split a `source` cell into normalized references.
pub fn parse_sources(cell: &str) -> Vec<String> {
    cell.split('+')
        .map(normalize_key)
        .filter(|source| !source.is_empty())
        .collect()
}

/// Parse a yes/no cell; blank is `false`.
pub fn parse_flag(cell: &str) -> Result<bool> {
    match cell.trim().to_lowercase().as_str() {
        "" | "no" | "n" | "false" | "0" => Ok(false),
        "yes" | "y" | "true" | "1" | "x" => Ok(true),
        other => Err(ModelError::InvalidRule(format!(
            "expected yes or no, found '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_conditions_copy_present_values() {
        let entries = parse_conditions("  ").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].condition, Condition::Present);
        assert_eq!(entries[0].value, ValueExpr::Value);
    }

    #[test]
    fn parses_condition_table() {
        let entries =
            parse_conditions("~^b => Book; !dvd => $value ; \"empty\" => <empty>; * => Other")
                .unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries[0].condition.is_match("bk"));
        assert!(entries[1].condition.is_match("CD"));
        assert!(!entries[1].condition.is_match(" DVD "));
        assert_eq!(entries[2].condition, Condition::Equals("empty".to_string()));
        assert_eq!(entries[2].value, ValueExpr::Empty);
        assert_eq!(entries[3].value, ValueExpr::Literal("Other".to_string()));
    }

    #[test]
    fn quoted_parts_may_contain_separators() {
        let cell = concat!(
            r#"~"^a;b" => "x; y"; "p => q" => "say ""hi"""; "#,
            r#"EMPTY => none; Present => "$value""#,
        );
        let entries = parse_conditions(cell).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries[0].condition.is_match("a;b"));
        assert_eq!(entries[0].value, ValueExpr::Literal("x; y".to_string()));
        assert!(entries[1].condition.is_match(" P => Q "));
        assert_eq!(entries[1].value, ValueExpr::Literal("say \"hi\"".to_string()));
        assert_eq!(entries[2].condition, Condition::Empty);
        assert_eq!(entries[3].condition, Condition::Present);
        assert_eq!(entries[3].value, ValueExpr::Literal("$value".to_string()));
    }

    #[test]
    fn quoted_forms_render_back_to_the_same_rule() {
        for (condition, value) in [("\"p => q\"", "\"a;b\""), ("\"empty\"", "\"<empty>\"")] {
            let parsed = Condition::parse(condition).unwrap();
            assert_eq!(Condition::parse(&parsed.to_string()).unwrap(), parsed);
            let expr = ValueExpr::parse(value);
            assert_eq!(ValueExpr::parse(&expr.to_string()), expr);
        }
        assert_eq!(ValueExpr::parse(" $VALUE "), ValueExpr::Value);
    }

    #[test]
    fn missing_arrow_is_rejected() {
        assert!(parse_conditions("book Book").is_err());
        assert!(parse_conditions("~[ => x").is_err());
    }

    #[test]
    fn lookup_cells() {
        assert_eq!(LookupRef::parse("").unwrap(), None);
        assert_eq!(
            LookupRef::parse(" Material_Types ").unwrap(),
            Some(LookupRef::Table("material_types".to_string()))
        );
        assert_eq!(
            LookupRef::parse("@holdings").unwrap(),
            Some(LookupRef::Identifier(ObjectType::Holdings))
        );
        assert!(LookupRef::parse("@shelf").is_err());
    }

    #[test]
    fn sources_are_split_and_normalized() {
        assert_eq!(parse_sources(" 245.A + 245.b +"), vec!["245.a", "245.b"]);
    }

    #[test]
    fn flags_and_kinds() {
        assert!(parse_flag("Yes").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
        assert_eq!(ValueKind::parse("BOOL").unwrap(), ValueKind::Boolean);
        assert!(ValueKind::parse("date").is_err());
    }
}
