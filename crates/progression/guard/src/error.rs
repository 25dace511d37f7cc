//! Error types for access checks

use thiserror::Error;

/// Membership lookups failed; no decision could be made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("membership directory unavailable: {0}")]
    Directory(String),
}

/// Result type for guard operations
pub type Result<T> = std::result::Result<T, GuardError>;
