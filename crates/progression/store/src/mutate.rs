//! Optimistic read-modify-write over [`ProfileStore::replace`].

use crate::traits::ProfileStore;
use crate::StorageError;
use progression_types::{ProfileKey, ProgressionProfile};
use tracing::warn;

/// Re-reads the profile, derives the next value and writes it back with a
/// revision check, retrying on conflict up to `max_attempts` times.
///
/// `apply` sees the freshest committed profile on every attempt. Returning
/// `Ok(None)` means nothing to write and yields the current profile.
pub async fn mutate_profile<S, F, E>(
    store: &S,
    key: &ProfileKey,
    max_attempts: u32,
    mut apply: F,
) -> Result<ProgressionProfile, E>
where
    S: ProfileStore + ?Sized,
    F: FnMut(&ProgressionProfile) -> Result<Option<ProgressionProfile>, E> + Send,
    E: From<StorageError> + Send,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let current = store
            .get(key)
            .await?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let Some(next) = apply(&current)? else {
            return Ok(current);
        };

        match store.replace(next, current.revision).await {
            Ok(stored) => return Ok(stored),
            Err(StorageError::Conflict(reason)) if attempt < max_attempts => {
                warn!(profile = %key, attempt, reason = %reason, "Profile write conflicted, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryProfileStore;
    use chrono::Utc;
    use progression_types::{AcademyId, PlayerId};
    use std::sync::Arc;

    fn key() -> ProfileKey {
        ProfileKey::new(AcademyId::new("north-fc"), PlayerId::new("p-1"))
    }

    #[tokio::test]
    async fn mutate_missing_profile_is_not_found() {
        let store = InMemoryProfileStore::new();
        let result: Result<_, StorageError> =
            mutate_profile(&store, &key(), 3, |p| Ok(Some(p.clone()))).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn mutate_noop_skips_write() {
        let store = InMemoryProfileStore::new();
        store.ensure(&key(), Utc::now()).await.unwrap();
        let profile = mutate_profile::<_, _, StorageError>(&store, &key(), 3, |_| Ok(None))
            .await
            .unwrap();
        assert_eq!(profile.revision, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutations_are_all_applied() {
        let store = Arc::new(InMemoryProfileStore::new());
        store.ensure(&key(), Utc::now()).await.unwrap();

        let writers = (0..8).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                mutate_profile::<_, _, StorageError>(store.as_ref(), &key(), 64, |p| {
                    let mut next = p.clone();
                    let seen = next.identity_key.take().unwrap_or_default();
                    next.identity_key = Some(format!("{seen}{i}"));
                    Ok(Some(next))
                })
                .await
            })
        });
        for writer in futures::future::join_all(writers).await {
            writer.unwrap().unwrap();
        }

        let profile = store.get(&key()).await.unwrap().unwrap();
        assert_eq!(profile.revision, 8);
        assert_eq!(profile.identity_key.unwrap().len(), 8);
    }
}
