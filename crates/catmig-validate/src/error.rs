use catmig_model::ObjectType;

/// Problems with a schema document itself. These stop the run.
///
/// `location` is where in the schema the problem sits, as
/// `<document>#<pointer>`; the main document has an empty name.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("schema for {object_type} is not a JSON object")]
    NotAnObject { object_type: ObjectType },

    #[error("schema for {object_type} has an invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        object_type: ObjectType,
        pattern: String,
        message: String,
    },

    #[error("schema for {object_type} uses unsupported keyword '{keyword}' at {location}")]
    UnsupportedKeyword {
        object_type: ObjectType,
        keyword: String,
        location: String,
    },

    #[error("schema for {object_type} uses unsupported format '{format}' at {location}")]
    UnsupportedFormat {
        object_type: ObjectType,
        format: String,
        location: String,
    },

    #[error("schema for {object_type} has unresolvable $ref '{reference}' at {location}")]
    UnresolvedReference {
        object_type: ObjectType,
        reference: String,
        location: String,
    },

    #[error("schema for {object_type} is malformed at {location}: {message}")]
    Malformed {
        object_type: ObjectType,
        location: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ValidateError>;
