#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record has no identifier; bulk-load lines need one")]
    MissingIdentifier,

    #[error("unknown output mode '{0}' (expected json-lines or bulk-load)")]
    UnknownMode(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
