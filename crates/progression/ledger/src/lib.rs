//! Progression Ledger - experience events and badge grants
//!
//! The ledger lives inside each progression profile. Entries are only ever
//! appended; nothing here rewrites or removes an earlier line. Point values
//! are not validated: the orchestrator decides what gets recorded.
//!
//! Repeated grants of the same badge are stored as separate lines unless the
//! caller supplies an idempotency key, in which case a replay of the same key
//! is a no-op.

#![deny(unsafe_code)]

use progression_store::{mutate_profile, ProfileStore, StorageError};
use progression_types::{
    BadgeGrant, BadgeId, ProfileKey, ProgressionProfile, XpEvent, XpEventType,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Default number of optimistic write attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Ledger operations over the profile store.
pub struct ProgressionLedger {
    store: Arc<dyn ProfileStore>,
    max_attempts: u32,
}

impl ProgressionLedger {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Append one experience event.
    pub async fn append_xp_event(
        &self,
        key: &ProfileKey,
        event: XpEvent,
    ) -> Result<ProgressionProfile, LedgerError> {
        let event_type = event.event_type;
        let points = event.points;
        let profile = mutate_profile(self.store.as_ref(), key, self.max_attempts, |current| {
            Ok::<_, LedgerError>(with_xp_event(current, event.clone()))
        })
        .await?;

        info!(profile = %key, event = %event_type, points, "Recorded experience event");
        Ok(profile)
    }

    /// Record a badge grant. No points are attached here.
    pub async fn grant_badge(
        &self,
        key: &ProfileKey,
        grant: BadgeGrant,
    ) -> Result<ProgressionProfile, LedgerError> {
        let badge_id = grant.badge_id.clone();
        let profile = mutate_profile(self.store.as_ref(), key, self.max_attempts, |current| {
            Ok::<_, LedgerError>(with_badge(current, grant.clone()))
        })
        .await?;

        info!(profile = %key, badge = %badge_id, "Recorded badge grant");
        Ok(profile)
    }

    pub async fn summary(&self, key: &ProfileKey) -> Result<LedgerSummary, LedgerError> {
        let profile = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| LedgerError::NotFound(key.to_string()))?;
        debug!(profile = %key, "Summarizing ledger");
        Ok(LedgerSummary::of(&profile))
    }
}

/// `profile` with `event` appended, or `None` when an event with the same
/// idempotency key is already recorded.
pub fn with_xp_event(profile: &ProgressionProfile, event: XpEvent) -> Option<ProgressionProfile> {
    if let Some(key) = &event.idempotency_key {
        let seen = profile
            .xp_events()
            .iter()
            .any(|e| e.idempotency_key.as_ref() == Some(key));
        if seen {
            debug!(idempotency_key = %key, "Experience event already recorded");
            return None;
        }
    }
    Some(profile.with_xp_event(event))
}

/// `profile` with `grant` appended, or `None` when a grant with the same
/// idempotency key is already recorded.
pub fn with_badge(profile: &ProgressionProfile, grant: BadgeGrant) -> Option<ProgressionProfile> {
    if let Some(key) = &grant.idempotency_key {
        let seen = profile
            .badges()
            .iter()
            .any(|g| g.idempotency_key.as_ref() == Some(key));
        if seen {
            debug!(idempotency_key = %key, "Badge grant already recorded");
            return None;
        }
    }
    Some(profile.with_badge(grant))
}

/// Aggregate view of a profile's ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_points: u64,
    pub event_count: usize,
    pub events_by_type: BTreeMap<XpEventType, usize>,
    pub badge_count: usize,
    pub distinct_badges: BTreeSet<BadgeId>,
}

impl LedgerSummary {
    pub fn of(profile: &ProgressionProfile) -> Self {
        let mut events_by_type = BTreeMap::new();
        for event in profile.xp_events() {
            *events_by_type.entry(event.event_type).or_insert(0) += 1;
        }
        Self {
            total_points: profile.total_points(),
            event_count: profile.xp_events().len(),
            events_by_type,
            badge_count: profile.badges().len(),
            distinct_badges: profile.badges().iter().map(|g| g.badge_id.clone()).collect(),
        }
    }
}

/// Ledger-related errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("profile not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => LedgerError::NotFound(key),
            other => LedgerError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use progression_store::InMemoryProfileStore;
    use progression_types::{AcademyId, ActorId, PlayerId};
    use proptest::prelude::*;

    fn key() -> ProfileKey {
        ProfileKey::new(AcademyId::new("north-fc"), PlayerId::new("p-1"))
    }

    fn coach() -> ActorId {
        ActorId::new("coach-1")
    }

    async fn seeded_ledger() -> (Arc<InMemoryProfileStore>, ProgressionLedger) {
        let store = Arc::new(InMemoryProfileStore::new());
        store.ensure(&key(), Utc::now()).await.unwrap();
        let ledger = ProgressionLedger::new(store.clone());
        (store, ledger)
    }

    #[tokio::test]
    async fn test_append_keeps_prior_entries() {
        let (_, ledger) = seeded_ledger().await;
        let first = XpEvent::new(XpEventType::FirstAssessment, coach(), Utc::now());
        let first_id = first.event_id.clone();
        ledger.append_xp_event(&key(), first).await.unwrap();
        let profile = ledger
            .append_xp_event(
                &key(),
                XpEvent::new(XpEventType::Reassessment, coach(), Utc::now()),
            )
            .await
            .unwrap();

        assert_eq!(profile.xp_events().len(), 2);
        assert_eq!(profile.xp_events()[0].event_id, first_id);
        assert_eq!(profile.total_points(), 70);
    }

    #[tokio::test]
    async fn test_idempotent_append() {
        let (_, ledger) = seeded_ledger().await;
        let event = || {
            XpEvent::new(XpEventType::Reassessment, coach(), Utc::now())
                .with_idempotency_key("assessment:2026-03-01")
        };
        ledger.append_xp_event(&key(), event()).await.unwrap();
        let profile = ledger.append_xp_event(&key(), event()).await.unwrap();
        assert_eq!(profile.xp_events().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_badge_grants_are_kept_without_key() {
        let (_, ledger) = seeded_ledger().await;
        let grant = BadgeGrant::new(BadgeId::new("iron-lungs"), coach(), Utc::now());
        ledger.grant_badge(&key(), grant.clone()).await.unwrap();
        let profile = ledger.grant_badge(&key(), grant).await.unwrap();
        assert_eq!(profile.badges().len(), 2);

        let summary = ledger.summary(&key()).await.unwrap();
        assert_eq!(summary.badge_count, 2);
        assert_eq!(summary.distinct_badges.len(), 1);
        // Grants alone carry no points.
        assert_eq!(summary.total_points, 0);
    }

    #[tokio::test]
    async fn test_badge_idempotency_key() {
        let (_, ledger) = seeded_ledger().await;
        let grant = BadgeGrant::new(BadgeId::new("iron-lungs"), coach(), Utc::now())
            .with_idempotency_key(Some("req-9".to_string()));
        ledger.grant_badge(&key(), grant.clone()).await.unwrap();
        let profile = ledger.grant_badge(&key(), grant).await.unwrap();
        assert_eq!(profile.badges().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let store = Arc::new(InMemoryProfileStore::new());
        let ledger = ProgressionLedger::new(store);
        let err = ledger
            .append_xp_event(
                &key(),
                XpEvent::new(XpEventType::BadgeGranted, coach(), Utc::now()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
        assert!(matches!(
            ledger.summary(&key()).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    fn event_type_strategy() -> impl Strategy<Value = XpEventType> {
        prop_oneof![
            Just(XpEventType::FirstAssessment),
            Just(XpEventType::Reassessment),
            Just(XpEventType::BadgeGranted),
            Just(XpEventType::StageUpgrade),
        ]
    }

    proptest! {
        #[test]
        fn property_ledger_only_grows(types in proptest::collection::vec(event_type_strategy(), 0..20)) {
            let mut profile = ProgressionProfile::new(key(), Utc::now());
            let mut expected_points = 0u64;
            for (i, event_type) in types.iter().enumerate() {
                let before = profile.xp_events().to_vec();
                profile = with_xp_event(&profile, XpEvent::new(*event_type, coach(), Utc::now()))
                    .expect("no idempotency key, always appended");
                expected_points += u64::from(event_type.points());

                prop_assert_eq!(profile.xp_events().len(), i + 1);
                prop_assert_eq!(&profile.xp_events()[..i], &before[..]);
            }
            let summary = LedgerSummary::of(&profile);
            prop_assert_eq!(summary.total_points, expected_points);
            prop_assert_eq!(summary.event_count, types.len());
        }
    }
}
