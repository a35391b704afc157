//! Source records with normalized field names.
//!
//! Keys are normalized exactly once, when the record is built. Lookups
//! normalize the requested key the same way, so any casing or surrounding
//! whitespace of a known column name finds the field. Values are kept as
//! read.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ModelError, Result};

/// Normalize a field name: surrounding whitespace removed, lower-cased.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Raw value of one source field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceValue {
    Text(String),
    List(Vec<SourceValue>),
    Fields(IndexMap<String, SourceValue>),
}

impl SourceValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// True if no text below this value has non-whitespace content.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.iter().all(SourceValue::is_blank),
            Self::Fields(fields) => fields.values().all(SourceValue::is_blank),
        }
    }

    /// Convert a JSON value, normalizing nested object keys. On collisions
    /// the first key in document order wins.
    pub fn from_json(value: &Value) -> Self {
        Self::collect_json(value, "", &mut Vec::new())
    }

    /// `duplicates` receives the dotted raw path of every dropped key.
    fn collect_json(value: &Value, path: &str, duplicates: &mut Vec<String>) -> Self {
        match value {
            Value::Null => Self::Text(String::new()),
            Value::String(text) => Self::Text(text.clone()),
            Value::Bool(_) | Value::Number(_) => Self::Text(value.to_string()),
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| Self::collect_json(item, path, duplicates))
                    .collect(),
            ),
            Value::Object(map) => {
                let mut fields = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    let nested = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    match fields.entry(normalize_key(key)) {
                        Entry::Occupied(_) => duplicates.push(nested),
                        Entry::Vacant(slot) => {
                            slot.insert(Self::collect_json(value, &nested, duplicates));
                        }
                    }
                }
                Self::Fields(fields)
            }
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::List(items) => Value::Array(items.iter().map(SourceValue::to_json).collect()),
            Self::Fields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Text(text) => out.push(text),
            Self::List(items) => {
                for item in items {
                    item.collect_texts(out);
                }
            }
            // A whole field group has no single text form.
            Self::Fields(_) => {}
        }
    }
}

impl From<String> for SourceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One legacy record, immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceRecord {
    fields: IndexMap<String, SourceValue>,
}

impl SourceRecord {
    /// Build a record from a raw row. On key collisions after normalization
    /// the first column wins.
    pub fn from_row<I, K, V>(row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SourceValue>,
    {
        Self::from_row_reporting_duplicates(row).0
    }

    /// Like [`SourceRecord::from_row`], also returning the raw names of
    /// columns dropped because their normalized name was already taken.
    pub fn from_row_reporting_duplicates<I, K, V>(row: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SourceValue>,
    {
        let mut fields = IndexMap::new();
        let mut duplicates = Vec::new();
        for (key, value) in row {
            match fields.entry(normalize_key(key.as_ref())) {
                Entry::Occupied(_) => duplicates.push(key.as_ref().to_string()),
                Entry::Vacant(slot) => {
                    slot.insert(value.into());
                }
            }
        }
        (Self { fields }, duplicates)
    }

    /// Build a record from a JSON object; nested objects become field groups.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::from_json_reporting_duplicates(value).map(|(record, _)| record)
    }

    /// Like [`SourceRecord::from_json`], also returning the dotted raw paths
    /// of keys dropped because their normalized name was already taken.
    pub fn from_json_reporting_duplicates(value: &Value) -> Result<(Self, Vec<String>)> {
        let mut duplicates = Vec::new();
        match SourceValue::collect_json(value, "", &mut duplicates) {
            SourceValue::Fields(fields) => Ok((Self { fields }, duplicates)),
            _ => Err(ModelError::NotAnObject {
                found: json_kind(value),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Result<&SourceValue> {
        self.find(key)
            .ok_or_else(|| ModelError::KeyNotFound(key.to_string()))
    }

    pub fn find(&self, key: &str) -> Option<&SourceValue> {
        self.fields.get(&normalize_key(key))
    }

    /// Text of a plain field, if present.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.find(key).and_then(SourceValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(&normalize_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Collect the text values found at a dotted reference such as `245.a`.
    ///
    /// A key that exists verbatim (dots included) is preferred over path
    /// navigation. Lists are walked element by element. Returns an empty
    /// vector when nothing is found and an error when the path descends
    /// into a plain text value.
    pub fn select(&self, reference: &str) -> Result<Vec<&str>> {
        let normalized = normalize_key(reference);
        let mut out = Vec::new();
        if let Some(value) = self.fields.get(&normalized) {
            value.collect_texts(&mut out);
            return Ok(out);
        }

        let mut segments = normalized.split('.');
        let Some(first) = segments.next() else {
            return Ok(out);
        };
        let Some(root) = self.fields.get(first.trim()) else {
            return Ok(out);
        };

        let mut current = vec![root];
        for segment in segments {
            let segment = segment.trim();
            let mut next = Vec::new();
            for value in current {
                descend(value, segment, reference, &mut next)?;
            }
            current = next;
        }
        for value in current {
            value.collect_texts(&mut out);
        }
        Ok(out)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

fn descend<'a>(
    value: &'a SourceValue,
    segment: &str,
    reference: &str,
    out: &mut Vec<&'a SourceValue>,
) -> Result<()> {
    match value {
        SourceValue::Fields(fields) => {
            if let Some(child) = fields.get(segment) {
                out.push(child);
            }
            Ok(())
        }
        SourceValue::List(items) => {
            for item in items {
                descend(item, segment, reference, out)?;
            }
            Ok(())
        }
        SourceValue::Text(_) => Err(ModelError::NotNested {
            path: reference.to_string(),
            segment: segment.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keys_are_normalized_once() {
        let record = SourceRecord::from_row([(" Barcode ", "123"), ("TITLE", "Cats")]);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["barcode", "title"]);
        assert_eq!(record.text("BARCODE"), Some("123"));
        assert_eq!(record.text("  barcode"), Some("123"));
    }

    #[test]
    fn values_are_not_altered() {
        let record = SourceRecord::from_row([("Note", "  Mixed Case  ")]);
        assert_eq!(record.text("note"), Some("  Mixed Case  "));
    }

    #[test]
    fn first_duplicate_column_wins() {
        let (record, duplicates) =
            SourceRecord::from_row_reporting_duplicates([("Barcode", "1"), ("BARCODE ", "2")]);
        assert_eq!(record.text("barcode"), Some("1"));
        assert_eq!(duplicates, vec!["BARCODE ".to_string()]);
    }

    #[test]
    fn colliding_json_keys_are_reported_with_their_path() {
        let (record, duplicates) = SourceRecord::from_json_reporting_duplicates(&json!({
            "Barcode": "1",
            "barcode ": "2",
            "holding": {"Location": "main", "location": "annex"}
        }))
        .unwrap();
        assert_eq!(record.text("barcode"), Some("1"));
        assert_eq!(record.select("holding.location").unwrap(), vec!["main"]);
        assert_eq!(duplicates, vec!["barcode ".to_string(), "holding.location".to_string()]);
    }

    #[test]
    fn select_walks_nested_lists() {
        let record = SourceRecord::from_json(&json!({
            "650": [{"a": "Cats"}, {"a": "Dogs", "x": "History"}],
            "245": {"A": "Title", "b": "subtitle"}
        }))
        .unwrap();
        assert_eq!(record.select("650.a").unwrap(), vec!["Cats", "Dogs"]);
        assert_eq!(record.select("245.a").unwrap(), vec!["Title"]);
        assert!(record.select("999.a").unwrap().is_empty());
    }

    #[test]
    fn select_into_scalar_is_malformed() {
        let record = SourceRecord::from_row([("title", "Cats")]);
        let err = record.select("title.a").unwrap_err();
        assert!(matches!(err, ModelError::NotNested { .. }));
    }

    #[test]
    fn json_scalars_become_text() {
        let record = SourceRecord::from_json(&json!({"copies": 2, "lost": false})).unwrap();
        assert_eq!(record.text("copies"), Some("2"));
        assert_eq!(record.text("lost"), Some("false"));
        assert!(SourceRecord::from_json(&json!([1, 2])).is_err());
    }
}
