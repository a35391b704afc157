//! Schema violations.
//!
//! Each variant carries only the data its message needs.

use std::fmt;

use serde::Serialize;

/// A single way a target record breaks its schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A `required` property is absent.
    Missing { path: String },
    /// Value has the wrong JSON type.
    TypeMismatch {
        path: String,
        expected: Vec<String>,
        found: &'static str,
    },
    /// Property not declared while `additionalProperties` is `false`.
    UnexpectedProperty { path: String },
    NotInEnum { path: String, value: String },
    ConstMismatch { path: String, expected: String },
    TooShort {
        path: String,
        length: usize,
        min: u64,
    },
    TooLong {
        path: String,
        length: usize,
        max: u64,
    },
    PatternMismatch { path: String, pattern: String },
    BelowMinimum { path: String, value: f64, min: f64 },
    AboveMaximum { path: String, value: f64, max: f64 },
    BelowExclusiveMinimum { path: String, value: f64, min: f64 },
    AboveExclusiveMaximum { path: String, value: f64, max: f64 },
    NotMultipleOf {
        path: String,
        value: f64,
        factor: f64,
    },
    TooFewItems {
        path: String,
        count: usize,
        min: u64,
    },
    TooManyItems {
        path: String,
        count: usize,
        max: u64,
    },
    DuplicateItems { path: String },
    TooFewProperties {
        path: String,
        count: usize,
        min: u64,
    },
    TooManyProperties {
        path: String,
        count: usize,
        max: u64,
    },
    InvalidFormat { path: String, format: String },
    /// No `anyOf` branch accepts the value.
    NoAlternativeMatched { path: String },
    /// `oneOf` needs exactly one accepting branch.
    AlternativeCount { path: String, matched: usize },
    /// The value matches a `not` schema.
    ExcludedShape { path: String },
    /// The schema at this position is `false`.
    Rejected { path: String },
}

impl Violation {
    /// Dotted path of the offending value; empty for the record itself.
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path }
            | Self::TypeMismatch { path, .. }
            | Self::UnexpectedProperty { path }
            | Self::NotInEnum { path, .. }
            | Self::ConstMismatch { path, .. }
            | Self::TooShort { path, .. }
            | Self::TooLong { path, .. }
            | Self::PatternMismatch { path, .. }
            | Self::BelowMinimum { path, .. }
            | Self::AboveMaximum { path, .. }
            | Self::BelowExclusiveMinimum { path, .. }
            | Self::AboveExclusiveMaximum { path, .. }
            | Self::NotMultipleOf { path, .. }
            | Self::TooFewItems { path, .. }
            | Self::TooManyItems { path, .. }
            | Self::DuplicateItems { path }
            | Self::TooFewProperties { path, .. }
            | Self::TooManyProperties { path, .. }
            | Self::InvalidFormat { path, .. }
            | Self::NoAlternativeMatched { path }
            | Self::AlternativeCount { path, .. }
            | Self::ExcludedShape { path }
            | Self::Rejected { path } => path,
        }
    }

    /// Schema keyword that produced the violation.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "required",
            Self::TypeMismatch { .. } => "type",
            Self::UnexpectedProperty { .. } => "additionalProperties",
            Self::NotInEnum { .. } => "enum",
            Self::ConstMismatch { .. } => "const",
            Self::TooShort { .. } => "minLength",
            Self::TooLong { .. } => "maxLength",
            Self::PatternMismatch { .. } => "pattern",
            Self::BelowMinimum { .. } => "minimum",
            Self::AboveMaximum { .. } => "maximum",
            Self::BelowExclusiveMinimum { .. } => "exclusiveMinimum",
            Self::AboveExclusiveMaximum { .. } => "exclusiveMaximum",
            Self::NotMultipleOf { .. } => "multipleOf",
            Self::TooFewItems { .. } => "minItems",
            Self::TooManyItems { .. } => "maxItems",
            Self::DuplicateItems { .. } => "uniqueItems",
            Self::TooFewProperties { .. } => "minProperties",
            Self::TooManyProperties { .. } => "maxProperties",
            Self::InvalidFormat { .. } => "format",
            Self::NoAlternativeMatched { .. } => "anyOf",
            Self::AlternativeCount { .. } => "oneOf",
            Self::ExcludedShape { .. } => "not",
            Self::Rejected { .. } => "false",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Missing { .. } => "required field is missing".to_string(),
            Self::TypeMismatch {
                expected, found, ..
            } => format!("expected {}, found {found}", expected.join(" or ")),
            Self::UnexpectedProperty { .. } => "property is not allowed".to_string(),
            Self::NotInEnum { value, .. } => format!("{value} is not an allowed value"),
            Self::ConstMismatch { expected, .. } => format!("value must be {expected}"),
            Self::TooShort { length, min, .. } => {
                format!("length {length} is shorter than {min}")
            }
            Self::TooLong { length, max, .. } => format!("length {length} is longer than {max}"),
            Self::PatternMismatch { pattern, .. } => format!("does not match '{pattern}'"),
            Self::BelowMinimum { value, min, .. } => format!("{value} is less than {min}"),
            Self::AboveMaximum { value, max, .. } => format!("{value} is greater than {max}"),
            Self::BelowExclusiveMinimum { value, min, .. } => {
                format!("{value} must be greater than {min}")
            }
            Self::AboveExclusiveMaximum { value, max, .. } => {
                format!("{value} must be less than {max}")
            }
            Self::NotMultipleOf { value, factor, .. } => {
                format!("{value} is not a multiple of {factor}")
            }
            Self::TooFewItems { count, min, .. } => {
                format!("{count} items, at least {min} required")
            }
            Self::TooManyItems { count, max, .. } => {
                format!("{count} items, at most {max} allowed")
            }
            Self::DuplicateItems { .. } => "items are not unique".to_string(),
            Self::TooFewProperties { count, min, .. } => {
                format!("{count} properties, at least {min} required")
            }
            Self::TooManyProperties { count, max, .. } => {
                format!("{count} properties, at most {max} allowed")
            }
            Self::InvalidFormat { format, .. } => format!("not a valid {format}"),
            Self::NoAlternativeMatched { .. } => "matches none of the allowed shapes".to_string(),
            Self::AlternativeCount { matched: 0, .. } => {
                "matches none of the alternatives".to_string()
            }
            Self::AlternativeCount { matched, .. } => {
                format!("matches {matched} alternatives, exactly one allowed")
            }
            Self::ExcludedShape { .. } => "matches a disallowed shape".to_string(),
            Self::Rejected { .. } => "no value is allowed here".to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path().is_empty() {
            "(record)"
        } else {
            self.path()
        };
        write!(f, "{path}: {}", self.message())
    }
}

/// Every violation found in one record, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// All violations on one line, separated by `; `.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
