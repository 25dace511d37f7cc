//! Error types for the progression orchestrator

use crate::sources::SourceError;
use progression_guard::{DenialReason, GuardError};
use progression_store::StorageError;
use progression_types::{BadgeId, Stage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Checked before any signal or profile is touched.
    #[error("not authorized: {0}")]
    NotAuthorized(DenialReason),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown badge: {0}")]
    UnknownBadge(BadgeId),

    #[error("{0} is the highest stage")]
    NoNextStage(Stage),

    /// The profile is no longer in the state the request was made against.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl ProgressionError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProgressionError::UpstreamUnavailable(_) => true,
            ProgressionError::Storage(err) => err.is_conflict(),
            _ => false,
        }
    }
}

impl From<StorageError> for ProgressionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => ProgressionError::NotFound(key),
            other => ProgressionError::Storage(other),
        }
    }
}

impl From<SourceError> for ProgressionError {
    fn from(err: SourceError) -> Self {
        ProgressionError::UpstreamUnavailable(err.to_string())
    }
}

impl From<GuardError> for ProgressionError {
    fn from(err: GuardError) -> Self {
        ProgressionError::UpstreamUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProgressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ProgressionError::from(SourceError::unavailable("attendance", "timeout")).is_retryable());
        assert!(ProgressionError::from(StorageError::Conflict("rev 3".into())).is_retryable());
        assert!(!ProgressionError::from(StorageError::Backend("disk".into())).is_retryable());
        assert!(!ProgressionError::NotAuthorized(DenialReason::NotAMember).is_retryable());
        assert!(!ProgressionError::NoNextStage(Stage::Diamond).is_retryable());
    }

    #[test]
    fn test_storage_not_found_is_not_found() {
        let err = ProgressionError::from(StorageError::NotFound("north/p-1".into()));
        assert!(matches!(err, ProgressionError::NotFound(_)));
    }

    #[test]
    fn test_directory_failure_is_upstream() {
        let err = ProgressionError::from(GuardError::Directory("timeout".into()));
        assert!(matches!(err, ProgressionError::UpstreamUnavailable(_)));
    }
}
