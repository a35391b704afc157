//! Schema validation of target records.

#![deny(unsafe_code)]

pub mod error;
pub mod issue;
pub mod validator;

pub use error::{Result, ValidateError};
pub use issue::{ValidationReport, Violation};
pub use validator::{SchemaDocuments, SchemaValidator, validate};
