//! Concurrent access and stage-history invariants.

mod common;

use chrono::Duration;
use common::{coach, harness, north, player, t0};
use futures::future::join_all;
use progression_service::{ApproveUpgradeRequest, Clock, GrantBadgeRequest, ProgressionError};
use progression_store::ProfileStore;
use progression_types::{ProfileKey, ProgressionProfile, Stage};
use proptest::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_advance_exactly_once() {
    let h = harness();
    h.service.profile(&coach(), &north(), &player()).await.unwrap();

    let approvals = (0..8).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move {
            service
                .approve_upgrade(
                    &coach(),
                    &north(),
                    &player(),
                    ApproveUpgradeRequest {
                        notes: None,
                        expected_stage: Some(Stage::Bronze),
                    },
                )
                .await
        })
    });
    let results: Vec<_> = join_all(approvals)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(failure, ProgressionError::InvalidTransition(_)),
            "unexpected failure: {failure}"
        );
    }

    let profile = h.service.profile(&coach(), &north(), &player()).await.unwrap();
    assert_eq!(profile.current_stage, Stage::Silver);
    assert_eq!(profile.stage_history().len(), 2);
    assert_eq!(profile.stage_history().open_count(), 1);
    assert_eq!(profile.xp_events().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_creates_one_profile() {
    let h = harness();
    let reads = (0..16).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move { service.profile(&coach(), &north(), &player()).await })
    });
    let profiles: Vec<ProgressionProfile> = join_all(reads)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(h.store.len().unwrap(), 1);
    assert!(profiles.iter().all(|p| p.created_at == profiles[0].created_at));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_badge_grants_are_all_recorded() {
    let h = harness();
    h.service.profile(&coach(), &north(), &player()).await.unwrap();

    let grants = (0..6).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move {
            service
                .grant_badge(&coach(), &north(), &player(), GrantBadgeRequest::new("team-player"))
                .await
        })
    });
    let mut granted = 0;
    for joined in join_all(grants).await {
        match joined.unwrap() {
            Ok(_) => granted += 1,
            // Bounded retries may run out under heavy contention.
            Err(err) => assert!(err.is_retryable(), "unexpected failure: {err}"),
        }
    }

    let stored = h
        .store
        .get(&ProfileKey::new(north(), player()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.badges().len(), granted);
    assert_eq!(stored.xp_events().len(), granted);
}

#[derive(Clone, Debug)]
enum Step {
    Approve,
    Assess(f64),
    Badge,
    Wait(i64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Approve),
        2 => (0.0f64..100.0).prop_map(Step::Assess),
        1 => Just(Step::Badge),
        2 => (1i64..60).prop_map(Step::Wait),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn property_stage_history_is_monotonic(steps in proptest::collection::vec(step_strategy(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let h = harness();
            let mut previous = h.service.profile(&coach(), &north(), &player()).await.unwrap();

            for step in steps {
                match step {
                    Step::Approve => {
                        let result = h
                            .service
                            .approve_upgrade(&coach(), &north(), &player(), ApproveUpgradeRequest::default())
                            .await;
                        if previous.current_stage == Stage::Diamond {
                            assert!(matches!(result, Err(ProgressionError::NoNextStage(_))));
                        } else {
                            assert!(result.is_ok());
                        }
                    }
                    Step::Assess(score) => {
                        h.assess(score, h.clock.now());
                        h.service
                            .sync_after_assessment(&coach(), &north(), &player())
                            .await
                            .unwrap();
                    }
                    Step::Badge => {
                        h.service
                            .grant_badge(&coach(), &north(), &player(), GrantBadgeRequest::new("leadership"))
                            .await
                            .unwrap();
                    }
                    Step::Wait(days) => h.clock.advance(Duration::days(days)),
                }

                let current = h.service.profile(&coach(), &north(), &player()).await.unwrap();
                assert!(current.is_consistent());
                assert_eq!(current.stage_history().open_count(), 1);
                assert!(current.current_stage >= previous.current_stage);
                assert!(current.xp_events().len() >= previous.xp_events().len());
                assert_eq!(
                    &current.stage_history().entries()[..previous.stage_history().len() - 1],
                    &previous.stage_history().entries()[..previous.stage_history().len() - 1],
                );
                assert!(current.stage_start_date >= t0());
                previous = current;
            }
        });
    }
}
