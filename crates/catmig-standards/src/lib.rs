//! Reference data and target schemas for catalog migration.
//!
//! Reference tables map legacy codes (location codes, material types,
//! patron groups) to target identifiers. They are fetched once, before
//! any record is processed, and are read-only while records are mapped.

#![deny(unsafe_code)]

pub mod csv_utils;
pub mod error;
pub mod hash;
pub mod reference;
pub mod schema;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, StandardsError};
pub use hash::{sha256_hex, table_fingerprint};
pub use reference::{
    FALLBACK_CODE, LookupTable, RefEntry, ReferenceDataCache, ReferenceRow, Resolution,
    TableSummary, Unresolved,
};
pub use schema::{DirectorySchemaSource, SchemaCache, SchemaSource, external_references};
pub use source::{DirectoryReferenceSource, ReferenceDataSource};
