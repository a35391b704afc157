//! Migration engine for legacy catalog records.
//!
//! Wires the reader, the rule-driven mapper, the schema validator and the
//! report together. Reference data and schemas are loaded by
//! [`EngineBuilder`] before the first record is mapped; afterwards the
//! engine only reads them.

#![deny(unsafe_code)]

pub mod engine;

pub use engine::{EngineBuilder, MigrationEngine};
