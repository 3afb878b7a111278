//! # Domain Errors
//!
//! Typed failures of repository operations. Absence of a match is always one
//! of these variants, never a panic.

use thiserror::Error;

/// Errors returned by the group repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No group document matches the requested identifier.
    #[error("group does not exist")]
    GroupNotExists,
    /// No group contains the requested member.
    #[error("member does not exist")]
    MemberNotExists,
    /// The presented credentials do not authorize the operation.
    #[error("no sufficient permissions")]
    NoSufficientPermissions,
    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification used by the boundary layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Internal,
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GroupNotExists | Self::MemberNotExists => ErrorKind::NotFound,
            Self::NoSufficientPermissions => ErrorKind::Forbidden,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn storage(details: impl Into<String>) -> Self {
        Self::Storage(details.into())
    }
}
