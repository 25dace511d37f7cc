//! Shared fixtures for the orchestrator integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use progression_service::{
    AccessGuard, Assessment, AttendanceRecord, InMemoryDirectory, InMemoryProfileStore,
    ManualClock, ProgressionService, Role, ServiceConfig, Sources, StaticBadgeRegistry,
};
use progression_types::{AcademyId, ActorContext, ActorId, CourseId, PlayerId};
use std::sync::Arc;

pub const COURSE: &str = "u12-skills";

pub struct Harness {
    pub service: Arc<ProgressionService>,
    pub directory: Arc<InMemoryDirectory>,
    pub store: Arc<InMemoryProfileStore>,
    pub clock: Arc<ManualClock>,
}

pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-05T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn north() -> AcademyId {
    AcademyId::new("north")
}

pub fn player() -> PlayerId {
    PlayerId::new("p-1")
}

pub fn coach() -> ActorContext {
    ActorContext::user("coach-1")
}

/// Academy `north` with one coach, an administrator and two players, and
/// `south` with one player. `p-1` is enrolled in one course.
pub fn harness() -> Harness {
    harness_with(ServiceConfig::default())
}

pub fn harness_with(config: ServiceConfig) -> Harness {
    let directory = Arc::new(InMemoryDirectory::new());
    for (academy, user, role) in [
        ("north", "coach-1", Role::Coach),
        ("north", "admin-1", Role::Administrator),
        ("north", "p-1", Role::Member),
        ("north", "p-2", Role::Member),
        ("south", "p-9", Role::Member),
        ("south", "coach-9", Role::Coach),
    ] {
        directory
            .add_member(AcademyId::new(academy), ActorId::new(user), role)
            .unwrap();
    }
    directory
        .enroll(north(), player(), CourseId::new(COURSE))
        .unwrap();

    let store = Arc::new(InMemoryProfileStore::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let service = ProgressionService::new(
        store.clone(),
        AccessGuard::new(directory.clone()),
        Sources::in_memory(directory.clone(), Arc::new(StaticBadgeRegistry::standard())),
        config,
    )
    .with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        directory,
        store,
        clock,
    }
}

impl Harness {
    pub fn assess(&self, na_score: f64, taken_at: DateTime<Utc>) {
        self.directory
            .record_assessment(north(), player(), Assessment { na_score, taken_at })
            .unwrap();
    }

    /// `attended` of `total` daily sessions starting the day after `from`.
    pub fn attend(&self, from: DateTime<Utc>, attended: usize, total: usize) {
        for day in 0..total {
            self.directory
                .record_attendance(
                    player(),
                    CourseId::new(COURSE),
                    AttendanceRecord {
                        session_date: from + Duration::days(day as i64 + 1),
                        present: day < attended,
                    },
                )
                .unwrap();
        }
    }
}
