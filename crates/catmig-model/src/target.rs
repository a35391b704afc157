//! Target records and the field paths used to address them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::Identifier;
use crate::{ModelError, Result};

/// Largest array index a path may name. Writing `notes[n]` pads the array
/// with `n` nulls, so the bound also caps that padding.
pub const MAX_ARRAY_INDEX: usize = 9_999;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
    /// `[]`: a new element at the end of an array.
    Append,
}

/// Location of a value in a target record: `title`, `notes[0].note`,
/// `formerIds[]`, `status.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = |message: &str| ModelError::InvalidFieldPath {
            path: raw.to_string(),
            message: message.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            let part = part.trim();
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(invalid("empty field name"));
            }
            segments.push(Segment::Key(name.to_string()));
            while !rest.is_empty() {
                let Some(close) = rest.find(']') else {
                    return Err(invalid("unclosed '['"));
                };
                if !rest.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
                let inner = rest[1..close].trim();
                if inner.is_empty() {
                    segments.push(Segment::Append);
                } else {
                    let index = inner
                        .parse::<usize>()
                        .map_err(|_| invalid("array index must be a number"))?;
                    if index > MAX_ARRAY_INDEX {
                        return Err(invalid(&format!(
                            "array index {index} is larger than {MAX_ARRAY_INDEX}"
                        )));
                    }
                    segments.push(Segment::Index(index));
                }
                rest = &rest[close + 1..];
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// First key of the path, e.g. `notes` for `notes[0].note`.
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Key(key)) => key,
            _ => "",
        }
    }

    /// Same path with an append step at the end.
    pub fn appending(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Append);
        Self {
            raw: format!("{}[]", self.raw),
            segments,
        }
    }
}

impl FromStr for FieldPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A record in the target platform's JSON model.
///
/// Object keys are kept sorted, so two equal records serialize to the same
/// bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetRecord {
    root: Map<String, Value>,
}

impl TargetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ModelError::PathConflict {
                path: String::new(),
                message: "target record must be an object".to_string(),
            }),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.root.get("id").and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: Identifier) {
        self.root.insert("id".to_string(), Value::String(id.to_string()));
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut segments = path.segments().iter();
        let Some(Segment::Key(first)) = segments.next() else {
            return None;
        };
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_some_and(|value| !value.is_null())
    }

    /// Write `value` at `path`, creating intermediate objects and arrays.
    /// An existing value at the exact path is replaced.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        let Some((Segment::Key(first), rest)) = path.segments().split_first() else {
            return Err(ModelError::InvalidFieldPath {
                path: path.as_str().to_string(),
                message: "path must start with a field name".to_string(),
            });
        };
        let slot = self.root.entry(first.clone()).or_insert(Value::Null);
        write_at(slot, rest, value, path)
    }

    /// Append `value` to the array at `path`, creating it if needed.
    pub fn append(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        self.set(&path.appending(), value)
    }

    /// Set `value` only if nothing is stored at `path` yet.
    pub fn set_if_absent(&mut self, path: &FieldPath, value: Value) -> Result<bool> {
        if self.contains(path) {
            return Ok(false);
        }
        self.set(path, value)?;
        Ok(true)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Compact single-line JSON.
    pub fn to_json_line(&self) -> String {
        // A map of JSON values always serializes.
        serde_json::to_string(&self.root).unwrap_or_default()
    }
}

fn write_at(slot: &mut Value, rest: &[Segment], value: Value, path: &FieldPath) -> Result<()> {
    let Some((head, rest)) = rest.split_first() else {
        *slot = value;
        return Ok(());
    };
    match head {
        Segment::Key(key) => {
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            let found = kind_of(slot);
            let Value::Object(map) = slot else {
                return Err(conflict(path, "an object", found));
            };
            let child = map.entry(key.clone()).or_insert(Value::Null);
            write_at(child, rest, value, path)
        }
        Segment::Index(index) => {
            let len = index
                .checked_add(1)
                .filter(|len| *len <= MAX_ARRAY_INDEX + 1)
                .ok_or_else(|| ModelError::PathConflict {
                    path: path.as_str().to_string(),
                    message: format!("array index {index} is out of range"),
                })?;
            let items = array_slot(slot, path)?;
            if items.len() < len {
                items.resize(len, Value::Null);
            }
            write_at(&mut items[*index], rest, value, path)
        }
        Segment::Append => {
            let items = array_slot(slot, path)?;
            items.push(Value::Null);
            let last = items.len() - 1;
            write_at(&mut items[last], rest, value, path)
        }
    }
}

fn array_slot<'a>(slot: &'a mut Value, path: &FieldPath) -> Result<&'a mut Vec<Value>> {
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    let found = kind_of(slot);
    match slot {
        Value::Array(items) => Ok(items),
        _ => Err(conflict(path, "an array", found)),
    }
}

fn conflict(path: &FieldPath, expected: &str, found: &str) -> ModelError {
    ModelError::PathConflict {
        path: path.as_str().to_string(),
        message: format!("expected {expected}, found {found}"),
    }
}

fn kind_of(value: &Value) -> &'static str {
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

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    #[test]
    fn parses_nested_and_indexed_paths() {
        let parsed = path("notes[0].note");
        assert_eq!(
            parsed.segments(),
            &[
                Segment::Key("notes".to_string()),
                Segment::Index(0),
                Segment::Key("note".to_string()),
            ]
        );
        assert_eq!(path("formerIds[]").segments()[1], Segment::Append);
        assert_eq!(parsed.root(), "notes");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("notes[x]").is_err());
        assert!(FieldPath::parse("notes[0").is_err());
    }

    #[test]
    fn oversized_index_is_rejected_when_parsed() {
        let err = FieldPath::parse("notes[18446744073709551615]").unwrap_err();
        assert!(matches!(err, ModelError::InvalidFieldPath { .. }));
        let err = FieldPath::parse("notes[100000000000].note").unwrap_err();
        assert!(err.to_string().contains("larger than 9999"), "{err}");
        assert!(FieldPath::parse(&format!("notes[{MAX_ARRAY_INDEX}]")).is_ok());
    }

    #[test]
    fn out_of_range_index_segment_conflicts_instead_of_panicking() {
        let huge = FieldPath {
            raw: "notes[huge]".to_string(),
            segments: vec![Segment::Key("notes".to_string()), Segment::Index(usize::MAX)],
        };
        let mut record = TargetRecord::new();
        let err = record.set(&huge, json!("x")).unwrap_err();
        assert!(matches!(err, ModelError::PathConflict { .. }));
    }

    #[test]
    fn set_creates_intermediate_structure() {
        let mut record = TargetRecord::new();
        record.set(&path("status.name"), json!("Available")).unwrap();
        record.set(&path("notes[1].note"), json!("second")).unwrap();
        assert_eq!(
            record.to_value(),
            json!({"status": {"name": "Available"}, "notes": [null, {"note": "second"}]})
        );
    }

    #[test]
    fn set_replaces_and_append_pushes() {
        let mut record = TargetRecord::new();
        record.set(&path("title"), json!("First")).unwrap();
        record.set(&path("title"), json!("Second")).unwrap();
        record.append(&path("formerIds"), json!("a")).unwrap();
        record.append(&path("formerIds"), json!("b")).unwrap();
        assert_eq!(record.get(&path("title")), Some(&json!("Second")));
        assert_eq!(record.get(&path("formerIds")), Some(&json!(["a", "b"])));
    }

    #[test]
    fn writing_through_a_scalar_conflicts() {
        let mut record = TargetRecord::new();
        record.set(&path("status"), json!("Available")).unwrap();
        let err = record.set(&path("status.name"), json!("x")).unwrap_err();
        assert!(matches!(err, ModelError::PathConflict { .. }));
    }

    #[test]
    fn json_line_has_sorted_keys() {
        let mut record = TargetRecord::new();
        record.set(&path("title"), json!("Cats")).unwrap();
        record.set(&path("barcode"), json!("1")).unwrap();
        assert_eq!(record.to_json_line(), r#"{"barcode":"1","title":"Cats"}"#);
    }
}
