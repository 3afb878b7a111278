//! # Error Types
//!
//! Errors raised while constructing domain values from untrusted input.

use thiserror::Error;

/// Domain value errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Role code outside `{0, 1}`.
    #[error("Unknown role code: {0}")]
    UnknownRole(i64),
}
