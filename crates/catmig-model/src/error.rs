use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("source field '{path}' is not nested: '{segment}' is a plain value")]
    NotNested { path: String, segment: String },

    #[error("source record must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("invalid field path '{path}': {message}")]
    InvalidFieldPath { path: String, message: String },

    #[error("cannot write '{path}': {message}")]
    PathConflict { path: String, message: String },

    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
