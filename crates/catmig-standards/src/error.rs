#![deny(unsafe_code)]

use std::path::PathBuf;

use catmig_model::ObjectType;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("failed to parse JSON {path}: {message}")]
    Json { path: PathBuf, message: String },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("reference table '{table}' is not available: {message}")]
    TableUnavailable { table: String, message: String },

    #[error("reference table '{table}' maps code '{code}' more than once")]
    DuplicateCode { table: String, code: String },

    #[error("no schema available for {object_type}: {message}")]
    SchemaUnavailable {
        object_type: ObjectType,
        message: String,
    },

    #[error("referenced schema document '{name}' is not available: {message}")]
    SchemaDocumentUnavailable { name: String, message: String },

    #[error("schema for {object_type} is invalid: {message}")]
    InvalidSchema {
        object_type: ObjectType,
        message: String,
    },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StandardsError>;
