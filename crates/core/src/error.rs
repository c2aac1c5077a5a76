//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// conflicts, immutability). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, constraint breach).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness conflict (e.g. duplicate username/email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An attempt to change a field that is immutable once created.
    #[error("immutable field: {0}")]
    ImmutableField(String),

    /// A requested entity was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn immutable(msg: impl Into<String>) -> Self {
        Self::ImmutableField(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
