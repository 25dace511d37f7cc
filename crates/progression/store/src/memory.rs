//! In-memory reference implementation of [`ProfileStore`].
//!
//! Deterministic and test-friendly. The single map lock makes get-or-create
//! and compare-and-swap atomic per process; a transactional backend would get
//! the same guarantees from a unique key and a revision predicate.

use crate::traits::ProfileStore;
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use progression_types::{AcademyId, ProfileKey, ProfilePatch, ProgressionProfile};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory profile store.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<ProfileKey, ProgressionProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub fn len(&self) -> StorageResult<usize> {
        let guard = self
            .profiles
            .read()
            .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
        Ok(guard.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn ensure(
        &self,
        key: &ProfileKey,
        now: DateTime<Utc>,
    ) -> StorageResult<ProgressionProfile> {
        {
            let guard = self
                .profiles
                .read()
                .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
            if let Some(existing) = guard.get(key) {
                return Ok(existing.clone());
            }
        }

        // Re-checked under the write lock: a concurrent caller may have won.
        let mut guard = self
            .profiles
            .write()
            .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
        let profile = guard.entry(key.clone()).or_insert_with(|| {
            debug!(profile = %key, "Creating progression profile");
            ProgressionProfile::new(key.clone(), now)
        });
        Ok(profile.clone())
    }

    async fn get(&self, key: &ProfileKey) -> StorageResult<Option<ProgressionProfile>> {
        let guard = self
            .profiles
            .read()
            .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn update(
        &self,
        key: &ProfileKey,
        patch: ProfilePatch,
    ) -> StorageResult<Option<ProgressionProfile>> {
        let mut guard = self
            .profiles
            .write()
            .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
        let Some(current) = guard.get(key) else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(current.clone()));
        }

        let next = patch
            .apply_to(current)
            .committed(current.revision + 1, Utc::now());
        guard.insert(key.clone(), next.clone());
        Ok(Some(next))
    }

    async fn replace(
        &self,
        profile: ProgressionProfile,
        expected_revision: u64,
    ) -> StorageResult<ProgressionProfile> {
        if !profile.is_consistent() {
            return Err(StorageError::InvariantViolation(format!(
                "profile {} stage history disagrees with stage {}",
                profile.key(),
                profile.current_stage
            )));
        }

        let key = profile.key();
        let mut guard = self
            .profiles
            .write()
            .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
        let current = guard
            .get(&key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        if current.revision != expected_revision {
            return Err(StorageError::Conflict(format!(
                "profile {} is at revision {}, expected {}",
                key, current.revision, expected_revision
            )));
        }

        let next = profile.committed(expected_revision + 1, Utc::now());
        guard.insert(key, next.clone());
        Ok(next)
    }

    async fn list_academy(
        &self,
        academy_id: &AcademyId,
    ) -> StorageResult<Vec<ProgressionProfile>> {
        let guard = self
            .profiles
            .read()
            .map_err(|_| StorageError::Backend("profiles lock poisoned".to_string()))?;
        let mut values = guard
            .values()
            .filter(|p| &p.academy_id == academy_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        Ok(values)
    }
}
