use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use progression_types::{AcademyId, ProfileKey, ProfilePatch, ProgressionProfile};

/// Storage interface for progression profiles.
///
/// Profiles are keyed by `(academy, player)` and never deleted. Every
/// committed write bumps the profile revision, which is what `replace`
/// compares against.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get-or-create. Concurrent first calls for one key produce one profile.
    async fn ensure(&self, key: &ProfileKey, now: DateTime<Utc>)
        -> StorageResult<ProgressionProfile>;

    /// Non-creating read.
    async fn get(&self, key: &ProfileKey) -> StorageResult<Option<ProgressionProfile>>;

    /// Merge the supplied fields; `None` when the profile does not exist.
    async fn update(
        &self,
        key: &ProfileKey,
        patch: ProfilePatch,
    ) -> StorageResult<Option<ProgressionProfile>>;

    /// Compare-and-swap write of a whole profile.
    ///
    /// Fails with `Conflict` when the stored revision is no longer
    /// `expected_revision`.
    async fn replace(
        &self,
        profile: ProgressionProfile,
        expected_revision: u64,
    ) -> StorageResult<ProgressionProfile>;

    /// All profiles of one academy, ordered by player.
    async fn list_academy(&self, academy_id: &AcademyId)
        -> StorageResult<Vec<ProgressionProfile>>;
}
