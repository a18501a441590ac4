use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("invalid {field_type} value {text:?}: {reason}")]
    InvalidValue {
        field_type: String,
        text: String,
        reason: String,
    },

    #[error("invalid WKT at offset {offset}: {reason}")]
    InvalidWkt { offset: usize, reason: String },
}
