//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// `NotFound` and `VersionConflict` are recoverable by the caller (create,
/// or re-read and retry). `Internal` means the current request cannot be
/// completed and should be surfaced as a generic failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// No record exists under the requested identifier.
    #[error("not found")]
    NotFound,

    /// The supplied entity tag does not match the record's current state.
    #[error("version conflict (supplied: {supplied:?}, current: {current})")]
    VersionConflict { supplied: String, current: String },

    /// Serialization, digest or lock failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn version_conflict(supplied: impl Into<String>, current: impl Into<String>) -> Self {
        Self::VersionConflict {
            supplied: supplied.into(),
            current: current.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
