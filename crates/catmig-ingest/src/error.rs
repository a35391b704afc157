#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid rule in {path} at line {line}: {message}")]
    InvalidRule {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Line of the offending input, when the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::InvalidRule { line, .. } => Some(*line),
            Self::Io { .. } | Self::MissingColumn { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
