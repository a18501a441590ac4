//! Error types for the diff crate.

use geovcs_types::{ObjectId, TypeError};

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] geovcs_store::StoreError),

    /// A value failed to encode or decode.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// A patch file could not be parsed.
    #[error("wrong patch content: {0}")]
    WrongPatchContent(String),

    /// An attribute or geometry diff could not be parsed.
    #[error("wrong difference content: {0}")]
    WrongDifference(String),

    /// A diff was applied to a value it was not computed against.
    #[error("diff cannot be applied: {0}")]
    CannotApply(String),

    /// A patch record references a feature type the patch does not carry.
    #[error("unknown feature type {0}")]
    UnknownFeatureType(ObjectId),

    /// A modify record names an attribute neither feature type declares.
    #[error("unknown attribute {attribute} at {path}")]
    UnknownAttribute { path: String, attribute: String },

    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    Pool(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
