use geovcs_types::{ObjectId, TypeError};

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The object exists but has a different kind than requested.
    #[error("object {id} is a {actual:?}, expected a {expected:?}")]
    UnexpectedKind {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// A text record could not be decoded.
    #[error("malformed {kind} record: {reason}")]
    Malformed { kind: &'static str, reason: String },

    /// An attribute value failed to decode.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Attempted to store an object with a null ID.
    #[error("cannot store object with null ID")]
    NullObjectId,

    /// The store has been closed; no further reads or writes are served.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
