//! Deterministic failures of access-control operations.
//!
//! Store outages are not modelled here; see `coursedesk_auth::StoreError`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input, or a reference to a record that does not exist.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The change would break a structural rule (e.g. orphaning children).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The record addressed by the request does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate id or unique key.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }

    /// Whether the caller, not the system, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidId(_))
    }
}
