//! Target object types handled by the migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Kind of record produced on the target platform.
///
/// Every object type has its own rule set, schema and identifier space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Instance,
    Holdings,
    Item,
    User,
    Course,
    Request,
    Reserve,
    Organization,
    Loan,
}

impl ObjectType {
    pub const ALL: [ObjectType; 9] = [
        ObjectType::Instance,
        ObjectType::Holdings,
        ObjectType::Item,
        ObjectType::User,
        ObjectType::Course,
        ObjectType::Request,
        ObjectType::Reserve,
        ObjectType::Organization,
        ObjectType::Loan,
    ];

    /// Stable machine name, also used as identifier derivation input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Holdings => "holdings",
            Self::Item => "item",
            Self::User => "user",
            Self::Course => "course",
            Self::Request => "request",
            Self::Reserve => "reserve",
            Self::Organization => "organization",
            Self::Loan => "loan",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Instance => "Instance",
            Self::Holdings => "Holdings record",
            Self::Item => "Item",
            Self::User => "User",
            Self::Course => "Course",
            Self::Request => "Request",
            Self::Reserve => "Course reserve",
            Self::Organization => "Organization",
            Self::Loan => "Loan",
        }
    }

    /// Parse an object type name, accepting plural and a few legacy aliases.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let key = value.trim().to_lowercase().replace(['-', ' '], "_");
        let parsed = match key.as_str() {
            "instance" | "instances" | "bib" | "bibs" => Self::Instance,
            "holdings" | "holding" | "holdings_record" | "holdingsrecord" => Self::Holdings,
            "item" | "items" => Self::Item,
            "user" | "users" | "patron" | "patrons" => Self::User,
            "course" | "courses" => Self::Course,
            "request" | "requests" => Self::Request,
            "reserve" | "reserves" | "course_reserve" => Self::Reserve,
            "organization" | "organizations" | "vendor" | "vendors" => Self::Organization,
            "loan" | "loans" | "transaction" | "circulation" => Self::Loan,
            _ => return Err(ModelError::UnknownObjectType(value.to_string())),
        };
        Ok(parsed)
    }
}

impl FromStr for ObjectType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
