//! Rule evaluation.
//!
//! For every rule, in order:
//!
//! 1. extract the source values (several `+`-joined references are
//!    concatenated with one space, empty parts skipped);
//! 2. resolve them through the rule's lookup, if any;
//! 3. pick the first condition entry matching the source value, or the
//!    rule's default when none matches. An optional lookup that misses
//!    skips the entries and writes only the default, if there is one;
//! 4. coerce the chosen value to the rule's kind and write it.
//!
//! Evaluation reads the reference cache and the identifier generator only,
//! so mapping a record twice yields the same target record.

use serde_json::{Number, Value};
use tracing::trace;

use catmig_model::{
    FieldPath, IdentifierGenerator, LookupRef, MappingRule, ModelError, SourceRecord,
    TargetRecord, ValueExpr, ValueKind,
};
use catmig_standards::{ReferenceDataCache, Resolution, Unresolved};

use crate::error::RecordError;
use crate::profile::ObjectProfile;
use crate::rule_set::RuleSet;
use crate::warning::MappingWarning;

/// Read-only collaborators shared by every record of a run.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    pub resolver: &'a ReferenceDataCache,
    pub ids: &'a IdentifierGenerator,
}

impl<'a> MappingContext<'a> {
    pub fn new(resolver: &'a ReferenceDataCache, ids: &'a IdentifierGenerator) -> Self {
        Self { resolver, ids }
    }
}

/// A successfully mapped record with what happened on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub record: TargetRecord,
    pub legacy_id: String,
    /// In the order they were raised.
    pub warnings: Vec<MappingWarning>,
    /// Target paths written by rules, in rule order, without repeats.
    pub populated: Vec<String>,
}

/// Evaluates rule sets. Separators are the only knobs.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    join_separator: String,
    list_separator: char,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self {
            join_separator: " ".to_string(),
            list_separator: '|',
        }
    }
}

/// One value on its way through a rule.
struct Candidate<'v> {
    source: &'v str,
    resolved: Option<(String, String)>,
    /// The lookup missed; only the rule's default may be written.
    unresolved: bool,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list_separator(mut self, separator: char) -> Self {
        self.list_separator = separator;
        self
    }

    /// Map one record: rules, then object defaults, then the identifier.
    pub fn map(
        &self,
        rules: &RuleSet,
        profile: &ObjectProfile,
        record: &SourceRecord,
        context: &MappingContext<'_>,
    ) -> Result<MappedRecord, RecordError> {
        let legacy_id = profile.legacy_id(record)?;
        let mut target = TargetRecord::new();
        let mut warnings = Vec::new();
        let mut populated: Vec<String> = Vec::new();

        for rule in rules.rules() {
            let wrote = self.apply_rule(rule, record, context, &mut target, &mut warnings)?;
            if wrote && !populated.iter().any(|path| path == rule.target.as_str()) {
                populated.push(rule.target.as_str().to_string());
            }
        }

        for (path, value) in profile.defaults() {
            target
                .set_if_absent(path, value.clone())
                .map_err(|error| conflict(path, &error))?;
        }
        target.set_id(context.ids.generate(&legacy_id, rules.object_type()));

        trace!(legacy_id = %legacy_id, fields = populated.len(), "record mapped");
        Ok(MappedRecord {
            record: target,
            legacy_id,
            warnings,
            populated,
        })
    }

    /// Returns whether the rule wrote anything.
    fn apply_rule(
        &self,
        rule: &MappingRule,
        record: &SourceRecord,
        context: &MappingContext<'_>,
        target: &mut TargetRecord,
        warnings: &mut Vec<MappingWarning>,
    ) -> Result<bool, RecordError> {
        let values = self.extract(rule, record)?;
        if rule.required && values.iter().all(|value| value.trim().is_empty()) {
            return Err(RecordError::RequiredFieldMissing {
                target: rule.target.to_string(),
                source_field: rule.sources.join(" + "),
            });
        }

        let mut wrote = false;
        for value in &values {
            let Some(candidate) = self.lookup(rule, value, context, warnings)? else {
                continue;
            };
            let Some(expr) = choose(rule, &candidate) else {
                continue;
            };
            let text = render(expr, &candidate);
            for json in self.coerce(rule, &text)? {
                write(target, rule, json)?;
                wrote = true;
            }
        }
        Ok(wrote)
    }

    /// Source values of a rule. Appending rules over a single reference get
    /// one value per list element; everything else gets one joined value.
    fn extract<'r>(
        &self,
        rule: &MappingRule,
        record: &'r SourceRecord,
    ) -> Result<Vec<String>, RecordError> {
        let mut parts: Vec<&'r str> = Vec::new();
        for reference in &rule.sources {
            let found = record.select(reference).map_err(|error| malformed(rule, &error))?;
            parts.extend(found.into_iter().filter(|text| !text.trim().is_empty()));
        }
        if rule.kind.appends() && rule.sources.len() == 1 && !parts.is_empty() {
            return Ok(parts.into_iter().map(|text| text.trim().to_string()).collect());
        }
        let joined = parts
            .iter()
            .map(|text| text.trim())
            .collect::<Vec<_>>()
            .join(&self.join_separator);
        Ok(vec![joined])
    }

    /// `None` means the rule writes nothing for this value.
    fn lookup<'v>(
        &self,
        rule: &MappingRule,
        value: &'v str,
        context: &MappingContext<'_>,
        warnings: &mut Vec<MappingWarning>,
    ) -> Result<Option<Candidate<'v>>, RecordError> {
        let source = value;
        let Some(lookup) = &rule.lookup else {
            return Ok(Some(Candidate {
                source,
                resolved: None,
                unresolved: false,
            }));
        };
        if value.trim().is_empty() {
            if rule.mandatory
                && let LookupRef::Table(table) = lookup
            {
                return Err(RecordError::MandatoryLookupUnresolved {
                    target: rule.target.to_string(),
                    reason: Unresolved::EmptyCode {
                        table: table.clone(),
                    },
                });
            }
            return Ok(Some(Candidate {
                source,
                resolved: None,
                unresolved: false,
            }));
        }

        match lookup {
            LookupRef::Identifier(object_type) => {
                let id = context.ids.generate(value, *object_type).to_string();
                Ok(Some(Candidate {
                    source,
                    resolved: Some((id, value.trim().to_string())),
                    unresolved: false,
                }))
            }
            LookupRef::Table(table) => match context.resolver.resolve(table, value) {
                Resolution::Found(entry) => Ok(Some(Candidate {
                    source,
                    resolved: Some((entry.id.clone(), entry.name.clone())),
                    unresolved: false,
                })),
                Resolution::Fallback(entry) => {
                    warnings.push(MappingWarning::FallbackUsed {
                        target: rule.target.to_string(),
                        table: table.clone(),
                        code: value.trim().to_string(),
                    });
                    Ok(Some(Candidate {
                        source,
                        resolved: Some((entry.id.clone(), entry.name.clone())),
                        unresolved: false,
                    }))
                }
                Resolution::Unresolved(reason) if reason.is_transient() => {
                    Err(RecordError::ReferenceDataNotLoaded {
                        target: rule.target.to_string(),
                        reason,
                    })
                }
                Resolution::Unresolved(reason) if rule.mandatory => {
                    Err(RecordError::MandatoryLookupUnresolved {
                        target: rule.target.to_string(),
                        reason,
                    })
                }
                Resolution::Unresolved(_) => {
                    warnings.push(MappingWarning::UnresolvedLookup {
                        target: rule.target.to_string(),
                        table: table.clone(),
                        code: value.trim().to_string(),
                    });
                    Ok(rule.default.as_ref().map(|_| Candidate {
                        source,
                        resolved: None,
                        unresolved: true,
                    }))
                }
            },
        }
    }

    fn coerce(&self, rule: &MappingRule, text: &str) -> Result<Vec<Value>, RecordError> {
        let invalid = || RecordError::InvalidValue {
            target: rule.target.to_string(),
            value: text.to_string(),
            kind: rule.kind,
        };
        let trimmed = text.trim();
        if trimmed.is_empty() && rule.kind != ValueKind::String {
            return Ok(Vec::new());
        }
        let value = match rule.kind {
            ValueKind::String => Value::String(text.to_string()),
            ValueKind::Array => Value::String(trimmed.to_string()),
            ValueKind::List => {
                return Ok(trimmed
                    .split(self.list_separator)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect());
            }
            ValueKind::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid())?,
            ValueKind::Number => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid)?,
            ValueKind::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Value::Bool(true),
                "false" | "f" | "no" | "n" | "0" => Value::Bool(false),
                _ => return Err(invalid()),
            },
        };
        Ok(vec![value])
    }
}

/// First matching entry, else the default. A missed lookup skips the entries.
fn choose<'r>(rule: &'r MappingRule, candidate: &Candidate<'_>) -> Option<&'r ValueExpr> {
    if candidate.unresolved {
        return rule.default.as_ref();
    }
    let source = candidate.source;
    rule.conditions
        .iter()
        .find(|entry| entry.condition.is_match(source))
        .map(|entry| &entry.value)
        .or(rule.default.as_ref())
}

fn render(expr: &ValueExpr, candidate: &Candidate<'_>) -> String {
    let source = candidate.source.trim();
    match expr {
        ValueExpr::Value => candidate
            .resolved
            .as_ref()
            .map_or_else(|| source.to_string(), |(id, _)| id.clone()),
        ValueExpr::Name => candidate
            .resolved
            .as_ref()
            .map_or_else(|| source.to_string(), |(_, name)| name.clone()),
        ValueExpr::Source => source.to_string(),
        ValueExpr::Empty => String::new(),
        ValueExpr::Literal(text) => text.clone(),
    }
}

fn write(target: &mut TargetRecord, rule: &MappingRule, value: Value) -> Result<(), RecordError> {
    let written = if rule.kind.appends() {
        target.append(&rule.target, value)
    } else {
        target.set(&rule.target, value)
    };
    written.map_err(|error| conflict(&rule.target, &error))
}

fn conflict(path: &FieldPath, error: &ModelError) -> RecordError {
    RecordError::TargetConflict {
        target: path.to_string(),
        message: error.to_string(),
    }
}

fn malformed(rule: &MappingRule, error: &ModelError) -> RecordError {
    RecordError::MalformedSource {
        message: format!("{}: {error}", rule.describe()),
    }
}
