//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Build-time structural errors.
///
/// These describe a broken declaration (a bug in the program defining its
/// command tree), never bad user input, so they are returned immediately and
/// are not subject to severity filtering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("name '{name}' is already used by {owner}")]
    DuplicateName { name: String, owner: String },

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid configuration for '{name}': {reason}")]
    InvalidConfiguration { name: String, reason: String },

    #[error("{0} is already bound to a command")]
    AlreadyBound(String),

    #[error("{0} already has an owner")]
    AlreadyOwned(String),

    #[error("unknown {0} node")]
    UnknownNode(&'static str),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
