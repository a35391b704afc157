//! JSON Schema validation of target records.
//!
//! Supported keywords: `type`, `required`, `properties`,
//! `patternProperties`, `additionalProperties`, `minProperties`,
//! `maxProperties`, `items`, `minItems`, `maxItems`, `uniqueItems`, `enum`,
//! `const`, `minLength`, `maxLength`, `pattern`, `format`, `minimum`,
//! `maximum`, `exclusiveMinimum`, `exclusiveMaximum` (number and draft-4
//! boolean forms), `multipleOf`, `allOf`, `anyOf`, `oneOf`, `not` and `$ref`.
//!
//! `$ref` resolves inside the schema (`#/definitions/..`) or into sibling
//! documents handed to [`SchemaValidator::with_documents`]
//! (`uuid.json`, `common.json#/definitions/note`). A schema that uses a
//! validation keyword outside this list, an unknown `format`, or a `$ref`
//! that does not resolve is rejected when the validator is built, so a
//! record is never passed by a check that was silently skipped. Keywords
//! with no validation meaning (`title`, `description`, `readonly`, ...) are
//! ignored.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use catmig_model::{ObjectType, TargetRecord};

use crate::error::{Result, ValidateError};
use crate::issue::{ValidationReport, Violation};

/// Nesting limit for `$ref` and combinator chains that do not descend into
/// data.
const MAX_SCHEMA_HOPS: usize = 64;

/// Validation keywords this validator does not evaluate.
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "additionalItems",
    "contains",
    "dependencies",
    "dependentRequired",
    "dependentSchemas",
    "else",
    "if",
    "maxContains",
    "minContains",
    "prefixItems",
    "propertyNames",
    "then",
    "unevaluatedItems",
    "unevaluatedProperties",
    "$dynamicRef",
    "$recursiveRef",
];

const SUPPORTED_FORMATS: &[&str] = &["uuid", "date-time", "date", "email", "uri"];

/// Sibling schema documents by the name `$ref` uses for them.
pub type SchemaDocuments = BTreeMap<String, Arc<Value>>;

/// A compiled schema for one object type.
///
/// Patterns are compiled and references checked once up front; the
/// validator is then shared read-only across workers.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    object_type: ObjectType,
    schema: Arc<Value>,
    documents: SchemaDocuments,
    patterns: HashMap<String, Regex>,
}

impl SchemaValidator {
    pub fn new(object_type: ObjectType, schema: Arc<Value>) -> Result<Self> {
        Self::with_documents(object_type, schema, SchemaDocuments::new())
    }

    /// Build a validator whose `$ref`s may point into `documents`.
    pub fn with_documents(
        object_type: ObjectType,
        schema: Arc<Value>,
        documents: SchemaDocuments,
    ) -> Result<Self> {
        if !schema.is_object() {
            return Err(ValidateError::NotAnObject { object_type });
        }
        let mut inspector = Inspector {
            object_type,
            documents: &documents,
            patterns: HashMap::new(),
        };
        inspector.inspect(&schema, &schema, "", "")?;
        for (name, document) in &documents {
            inspector.inspect(document, document, name, "")?;
        }
        let patterns = inspector.patterns;
        debug!(
            object_type = %object_type,
            documents = documents.len(),
            patterns = patterns.len(),
            "schema compiled"
        );
        Ok(Self {
            object_type,
            schema,
            documents,
            patterns,
        })
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check a record, collecting every violation rather than the first.
    pub fn validate(&self, record: &TargetRecord) -> ValidationReport {
        self.validate_value(&record.to_value())
    }

    pub fn validate_value(&self, instance: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut walk = Walk {
            documents: &self.documents,
            patterns: &self.patterns,
            report: &mut report,
        };
        walk.check(&self.schema, &self.schema, instance, "", 0);
        report
    }
}

/// One-off validation; compiles the schema on every call.
pub fn validate(
    record: &TargetRecord,
    object_type: ObjectType,
    schema: &Value,
) -> Result<ValidationReport> {
    let validator = SchemaValidator::new(object_type, Arc::new(schema.clone()))?;
    Ok(validator.validate(record))
}

/// Walks a schema document once at build time.
struct Inspector<'a> {
    object_type: ObjectType,
    documents: &'a SchemaDocuments,
    patterns: HashMap<String, Regex>,
}

impl Inspector<'_> {
    fn inspect(
        &mut self,
        schema: &Value,
        root: &Value,
        document: &str,
        pointer: &str,
    ) -> Result<()> {
        let map = match schema {
            Value::Object(map) => map,
            Value::Bool(_) => return Ok(()),
            _ => {
                return Err(self.malformed(document, pointer, "expected a schema object"));
            }
        };
        for (keyword, value) in map {
            let here = format!("{pointer}/{keyword}");
            if UNSUPPORTED_KEYWORDS.contains(&keyword.as_str()) {
                return Err(ValidateError::UnsupportedKeyword {
                    object_type: self.object_type,
                    keyword: keyword.clone(),
                    location: location(document, pointer),
                });
            }
            match (keyword.as_str(), value) {
                ("$ref", Value::String(reference)) => {
                    if resolve_ref(root, self.documents, reference).is_none() {
                        return Err(ValidateError::UnresolvedReference {
                            object_type: self.object_type,
                            reference: reference.clone(),
                            location: location(document, pointer),
                        });
                    }
                }
                ("pattern", Value::String(pattern)) => self.compile(pattern)?,
                ("format", Value::String(format)) => {
                    if !SUPPORTED_FORMATS.contains(&format.as_str()) {
                        return Err(ValidateError::UnsupportedFormat {
                            object_type: self.object_type,
                            format: format.clone(),
                            location: location(document, pointer),
                        });
                    }
                }
                ("patternProperties", Value::Object(children)) => {
                    for (pattern, child) in children {
                        self.compile(pattern)?;
                        self.inspect(child, root, document, &format!("{here}/{pattern}"))?;
                    }
                }
                ("properties" | "definitions" | "$defs", Value::Object(children)) => {
                    for (name, child) in children {
                        self.inspect(child, root, document, &format!("{here}/{name}"))?;
                    }
                }
                ("allOf" | "anyOf" | "oneOf", Value::Array(parts)) => {
                    if parts.is_empty() {
                        return Err(self.malformed(document, &here, "must not be empty"));
                    }
                    for (index, part) in parts.iter().enumerate() {
                        self.inspect(part, root, document, &format!("{here}/{index}"))?;
                    }
                }
                ("items", Value::Array(parts)) => {
                    for (index, part) in parts.iter().enumerate() {
                        self.inspect(part, root, document, &format!("{here}/{index}"))?;
                    }
                }
                ("items" | "not" | "additionalProperties", child) => {
                    self.inspect(child, root, document, &here)?;
                }
                ("$ref" | "pattern" | "format", _) => {
                    return Err(self.malformed(document, &here, "expected a string"));
                }
                ("patternProperties" | "properties" | "definitions" | "$defs", _) => {
                    return Err(self.malformed(document, &here, "expected an object"));
                }
                ("allOf" | "anyOf" | "oneOf", _) => {
                    return Err(self.malformed(document, &here, "expected an array"));
                }
                ("multipleOf", factor) if factor.as_f64().is_none_or(|f| f <= 0.0) => {
                    return Err(self.malformed(document, &here, "expected a positive number"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn compile(&mut self, pattern: &str) -> Result<()> {
        if self.patterns.contains_key(pattern) {
            return Ok(());
        }
        let regex = Regex::new(pattern).map_err(|error| ValidateError::InvalidPattern {
            object_type: self.object_type,
            pattern: pattern.to_string(),
            message: error.to_string(),
        })?;
        self.patterns.insert(pattern.to_string(), regex);
        Ok(())
    }

    fn malformed(&self, document: &str, pointer: &str, message: &str) -> ValidateError {
        ValidateError::Malformed {
            object_type: self.object_type,
            location: location(document, pointer),
            message: message.to_string(),
        }
    }
}

fn location(document: &str, pointer: &str) -> String {
    format!("{document}#{pointer}")
}

struct Walk<'a> {
    documents: &'a SchemaDocuments,
    patterns: &'a HashMap<String, Regex>,
    report: &'a mut ValidationReport,
}

impl Walk<'_> {
    /// `root` is the document `schema` belongs to; local `$ref`s resolve
    /// against it.
    fn check(&mut self, schema: &Value, root: &Value, instance: &Value, path: &str, hops: usize) {
        let schema = match schema {
            Value::Object(schema) => schema,
            Value::Bool(false) => {
                self.report.push(Violation::Rejected {
                    path: path.to_string(),
                });
                return;
            }
            _ => return,
        };
        if hops > MAX_SCHEMA_HOPS {
            debug!(path, "schema reference chain too deep; skipping");
            return;
        }

        let documents = self.documents;
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str)
            && let Some((target_root, target)) = resolve_ref(root, documents, reference)
        {
            self.check(target, target_root, instance, path, hops + 1);
        }
        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            for part in parts {
                self.check(part, root, instance, path, hops + 1);
            }
        }
        if let Some(parts) = schema.get("anyOf").and_then(Value::as_array)
            && !parts
                .iter()
                .any(|part| self.accepts(part, root, instance, path, hops + 1))
        {
            self.report.push(Violation::NoAlternativeMatched {
                path: path.to_string(),
            });
        }
        if let Some(parts) = schema.get("oneOf").and_then(Value::as_array) {
            let matched = parts
                .iter()
                .filter(|part| self.accepts(part, root, instance, path, hops + 1))
                .count();
            if matched != 1 {
                self.report.push(Violation::AlternativeCount {
                    path: path.to_string(),
                    matched,
                });
            }
        }
        if let Some(excluded) = schema.get("not")
            && self.accepts(excluded, root, instance, path, hops + 1)
        {
            self.report.push(Violation::ExcludedShape {
                path: path.to_string(),
            });
        }

        if let Some(expected) = schema.get("type")
            && !type_matches(expected, instance)
        {
            self.report.push(Violation::TypeMismatch {
                path: path.to_string(),
                expected: type_names(expected),
                found: json_type(instance),
            });
            // Keyword checks below assume the declared type.
            return;
        }

        if let Some(allowed) = schema.get("enum").and_then(Value::as_array)
            && !allowed.contains(instance)
        {
            self.report.push(Violation::NotInEnum {
                path: path.to_string(),
                value: instance.to_string(),
            });
        }
        if let Some(expected) = schema.get("const")
            && expected != instance
        {
            self.report.push(Violation::ConstMismatch {
                path: path.to_string(),
                expected: expected.to_string(),
            });
        }

        match instance {
            Value::Object(object) => self.check_object(schema, root, object, path),
            Value::Array(items) => self.check_array(schema, root, items, path),
            Value::String(text) => self.check_string(schema, text, path),
            Value::Number(number) => {
                if let Some(value) = number.as_f64() {
                    self.check_number(schema, value, path);
                }
            }
            Value::Bool(_) | Value::Null => {}
        }
    }

    /// Whether `schema` accepts `instance`, without recording anything.
    fn accepts(
        &self,
        schema: &Value,
        root: &Value,
        instance: &Value,
        path: &str,
        hops: usize,
    ) -> bool {
        let mut scratch = ValidationReport::default();
        let mut walk = Walk {
            documents: self.documents,
            patterns: self.patterns,
            report: &mut scratch,
        };
        walk.check(schema, root, instance, path, hops);
        scratch.is_valid()
    }

    fn check_object(
        &mut self,
        schema: &Map<String, Value>,
        root: &Value,
        object: &Map<String, Value>,
        path: &str,
    ) {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if object.get(name).is_none_or(Value::is_null) {
                    self.report.push(Violation::Missing {
                        path: join_key(path, name),
                    });
                }
            }
        }
        if let Some(min) = schema.get("minProperties").and_then(Value::as_u64)
            && (object.len() as u64) < min
        {
            self.report.push(Violation::TooFewProperties {
                path: path.to_string(),
                count: object.len(),
                min,
            });
        }
        if let Some(max) = schema.get("maxProperties").and_then(Value::as_u64)
            && (object.len() as u64) > max
        {
            self.report.push(Violation::TooManyProperties {
                path: path.to_string(),
                count: object.len(),
                max,
            });
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let pattern_properties = schema.get("patternProperties").and_then(Value::as_object);
        let additional = schema.get("additionalProperties");
        for (name, value) in object {
            let child = join_key(path, name);
            let mut declared = false;
            if let Some(property) = properties.and_then(|props| props.get(name)) {
                declared = true;
                self.check(property, root, value, &child, 0);
            }
            for (pattern, property) in pattern_properties.into_iter().flatten() {
                if self
                    .patterns
                    .get(pattern)
                    .is_some_and(|regex| regex.is_match(name))
                {
                    declared = true;
                    self.check(property, root, value, &child, 0);
                }
            }
            if declared {
                continue;
            }
            match additional {
                Some(Value::Bool(false)) => {
                    self.report.push(Violation::UnexpectedProperty { path: child });
                }
                Some(extra @ Value::Object(_)) => self.check(extra, root, value, &child, 0),
                _ => {}
            }
        }
    }

    fn check_array(
        &mut self,
        schema: &Map<String, Value>,
        root: &Value,
        items: &[Value],
        path: &str,
    ) {
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64)
            && (items.len() as u64) < min
        {
            self.report.push(Violation::TooFewItems {
                path: path.to_string(),
                count: items.len(),
                min,
            });
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64)
            && (items.len() as u64) > max
        {
            self.report.push(Violation::TooManyItems {
                path: path.to_string(),
                count: items.len(),
                max,
            });
        }
        if schema.get("uniqueItems").and_then(Value::as_bool) == Some(true) && has_duplicates(items)
        {
            self.report.push(Violation::DuplicateItems {
                path: path.to_string(),
            });
        }

        match schema.get("items") {
            Some(item_schema @ (Value::Object(_) | Value::Bool(_))) => {
                for (index, item) in items.iter().enumerate() {
                    self.check(item_schema, root, item, &join_index(path, index), 0);
                }
            }
            Some(Value::Array(positional)) => {
                for (index, (item_schema, item)) in positional.iter().zip(items).enumerate() {
                    self.check(item_schema, root, item, &join_index(path, index), 0);
                }
            }
            _ => {}
        }
    }

    fn check_string(&mut self, schema: &Map<String, Value>, text: &str, path: &str) {
        let length = text.chars().count();
        if let Some(min) = schema.get("minLength").and_then(Value::as_u64)
            && (length as u64) < min
        {
            self.report.push(Violation::TooShort {
                path: path.to_string(),
                length,
                min,
            });
        }
        if let Some(max) = schema.get("maxLength").and_then(Value::as_u64)
            && (length as u64) > max
        {
            self.report.push(Violation::TooLong {
                path: path.to_string(),
                length,
                max,
            });
        }
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str)
            && let Some(regex) = self.patterns.get(pattern)
            && !regex.is_match(text)
        {
            self.report.push(Violation::PatternMismatch {
                path: path.to_string(),
                pattern: pattern.to_string(),
            });
        }
        if let Some(format) = schema.get("format").and_then(Value::as_str)
            && !format_matches(format, text)
        {
            self.report.push(Violation::InvalidFormat {
                path: path.to_string(),
                format: format.to_string(),
            });
        }
    }

    fn check_number(&mut self, schema: &Map<String, Value>, value: f64, path: &str) {
        // Draft 4 spells exclusive bounds as a flag next to minimum/maximum.
        let flag = |keyword: &str| schema.get(keyword).and_then(Value::as_bool) == Some(true);
        let exclusive_min_flag = flag("exclusiveMinimum");
        let exclusive_max_flag = flag("exclusiveMaximum");

        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if exclusive_min_flag && value <= min {
                self.report.push(Violation::BelowExclusiveMinimum {
                    path: path.to_string(),
                    value,
                    min,
                });
            } else if value < min {
                self.report.push(Violation::BelowMinimum {
                    path: path.to_string(),
                    value,
                    min,
                });
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if exclusive_max_flag && value >= max {
                self.report.push(Violation::AboveExclusiveMaximum {
                    path: path.to_string(),
                    value,
                    max,
                });
            } else if value > max {
                self.report.push(Violation::AboveMaximum {
                    path: path.to_string(),
                    value,
                    max,
                });
            }
        }
        if let Some(min) = schema.get("exclusiveMinimum").and_then(Value::as_f64)
            && value <= min
        {
            self.report.push(Violation::BelowExclusiveMinimum {
                path: path.to_string(),
                value,
                min,
            });
        }
        if let Some(max) = schema.get("exclusiveMaximum").and_then(Value::as_f64)
            && value >= max
        {
            self.report.push(Violation::AboveExclusiveMaximum {
                path: path.to_string(),
                value,
                max,
            });
        }
        if let Some(factor) = schema.get("multipleOf").and_then(Value::as_f64)
            && factor > 0.0
        {
            let quotient = value / factor;
            if (quotient - quotient.round()).abs() > 1e-9 {
                self.report.push(Violation::NotMultipleOf {
                    path: path.to_string(),
                    value,
                    factor,
                });
            }
        }
    }
}

/// `reference` is `<document>#<pointer>`, `<document>` or `#<pointer>`.
/// Returns the target and the document it lives in.
fn resolve_ref<'a>(
    root: &'a Value,
    documents: &'a SchemaDocuments,
    reference: &str,
) -> Option<(&'a Value, &'a Value)> {
    let (document, pointer) = reference.split_once('#').unwrap_or((reference, ""));
    let document_root = if document.is_empty() {
        root
    } else {
        documents.get(document)?.as_ref()
    };
    let target = if pointer.is_empty() {
        document_root
    } else {
        document_root.pointer(pointer)?
    };
    Some((document_root, target))
}

fn type_matches(expected: &Value, instance: &Value) -> bool {
    match expected {
        Value::String(name) => is_type(name, instance),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| is_type(name, instance)),
        _ => true,
    }
}

fn is_type(name: &str, instance: &Value) -> bool {
    match name {
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "boolean" => instance.is_boolean(),
        "null" => instance.is_null(),
        "number" => instance.is_number(),
        "integer" => match instance {
            Value::Number(number) => {
                number.is_i64()
                    || number.is_u64()
                    || number.as_f64().is_some_and(|value| value.fract() == 0.0)
            }
            _ => false,
        },
        _ => true,
    }
}

fn type_names(expected: &Value) -> Vec<String> {
    match expected {
        Value::String(name) => vec![name.clone()],
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(index, item)| items[index + 1..].contains(item))
}

fn format_matches(format: &str, text: &str) -> bool {
    match format {
        "uuid" => is_uuid(text),
        "date-time" => DateTime::parse_from_rfc3339(text).is_ok(),
        "date" => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        "email" => is_email(text),
        "uri" => is_uri(text),
        _ => true,
    }
}

/// Hyphenated form only, as the target platform writes it.
fn is_uuid(text: &str) -> bool {
    text.len() == 36 && uuid::Uuid::try_parse(text).is_ok()
}

fn is_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !text.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// An absolute URI: a scheme, a colon, and no whitespace.
fn is_uri(text: &str) -> bool {
    let Some((scheme, _)) = text.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !text.chars().any(char::is_whitespace)
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn validator(schema: Value) -> SchemaValidator {
        SchemaValidator::new(ObjectType::Instance, Arc::new(schema)).unwrap()
    }

    #[test]
    fn integer_accepts_whole_floats_only() {
        let v = validator(json!({"type": "integer"}));
        assert!(v.validate_value(&json!(3)).is_valid());
        assert!(v.validate_value(&json!(3.0)).is_valid());
        assert!(!v.validate_value(&json!(3.5)).is_valid());
    }

    #[test]
    fn type_mismatch_stops_further_checks_on_that_value() {
        let v = validator(json!({"type": "string", "minLength": 3}));
        let report = v.validate_value(&json!(12));
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].keyword(), "type");
    }

    #[test]
    fn self_reference_does_not_loop() {
        let v = validator(json!({"$ref": "#"}));
        assert!(v.validate_value(&json!({})).is_valid());
    }

    #[test]
    fn bad_pattern_is_rejected_up_front() {
        let err = SchemaValidator::new(
            ObjectType::Item,
            Arc::new(json!({"properties": {"barcode": {"pattern": "("}}})),
        )
        .unwrap_err();
        assert!(matches!(err, ValidateError::InvalidPattern { .. }));
    }

    #[test]
    fn non_object_schema_is_rejected() {
        let err = SchemaValidator::new(ObjectType::Item, Arc::new(json!(true))).unwrap_err();
        assert!(matches!(err, ValidateError::NotAnObject { .. }));
    }

    #[test]
    fn draft4_exclusive_flag_tightens_minimum() {
        let v = validator(json!({"minimum": 0, "exclusiveMinimum": true, "maximum": 5}));
        let report = v.validate_value(&json!(0));
        assert_eq!(report.violations()[0].keyword(), "exclusiveMinimum");
        assert!(v.validate_value(&json!(5)).is_valid());
    }

    #[test]
    fn property_named_like_a_keyword_is_not_a_keyword() {
        let v = validator(json!({"properties": {"contains": {"type": "string"}}}));
        assert!(v.validate_value(&json!({"contains": "x"})).is_valid());
    }

    #[test]
    fn formats_are_checked() {
        for (format, good, bad) in [
            ("date-time", "2024-03-01T10:00:00Z", "2024-03-01 10:00"),
            ("date", "2024-03-01", "03/01/2024"),
            ("email", "reader@example.org", "reader at example"),
            ("uri", "https://example.org/a", "not a uri"),
        ] {
            let v = validator(json!({"type": "string", "format": format}));
            assert!(v.validate_value(&json!(good)).is_valid(), "{format} {good}");
            assert!(!v.validate_value(&json!(bad)).is_valid(), "{format} {bad}");
        }
    }

    #[test]
    fn pattern_properties_exempt_from_additional_properties() {
        let v = validator(json!({
            "patternProperties": {"^x-": {"type": "string"}},
            "additionalProperties": false
        }));
        let report = v.validate_value(&json!({"x-tag": 1, "other": true}));
        let lines: Vec<String> = report.violations().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "other: property is not allowed".to_string(),
                "x-tag: expected string, found integer".to_string(),
            ]
        );
    }
}
