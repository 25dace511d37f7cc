//! In-memory collaborators for tests and the daemon's seeded mode.

use crate::sources::{
    Assessment, AssessmentSource, AttendanceRecord, AttendanceSource, EnrollmentDirectory,
    SourceError, SourceResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use progression_guard::{GuardError, MembershipDirectory, Role};
use progression_types::{AcademyId, ActorId, CourseId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Serializable directory contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub memberships: Vec<MembershipSeed>,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentSeed>,
    #[serde(default)]
    pub attendance: Vec<AttendanceSeed>,
    #[serde(default)]
    pub assessments: Vec<AssessmentSeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipSeed {
    pub academy_id: String,
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSeed {
    pub academy_id: String,
    pub player_id: String,
    pub course_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSeed {
    pub player_id: String,
    pub course_id: String,
    pub session_date: DateTime<Utc>,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSeed {
    pub academy_id: String,
    pub player_id: String,
    pub na_score: f64,
    pub taken_at: DateTime<Utc>,
}

#[derive(Default)]
struct DirectoryState {
    roles: HashMap<(AcademyId, ActorId), Role>,
    enrollments: HashMap<(AcademyId, PlayerId), Vec<CourseId>>,
    attendance: HashMap<(PlayerId, CourseId), Vec<AttendanceRecord>>,
    assessments: HashMap<(AcademyId, PlayerId), Vec<Assessment>>,
}

/// Membership, enrollment, attendance and assessment data held in memory.
///
/// `set_unavailable(true)` makes every lookup fail, which is how tests
/// exercise upstream outages.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    unavailable: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: DirectorySeed) -> SourceResult<Self> {
        let directory = Self::new();
        for m in seed.memberships {
            directory.add_member(AcademyId::new(m.academy_id), ActorId::new(m.user_id), m.role)?;
        }
        for e in seed.enrollments {
            directory.enroll(
                AcademyId::new(e.academy_id),
                PlayerId::new(e.player_id),
                CourseId::new(e.course_id),
            )?;
        }
        for a in seed.attendance {
            directory.record_attendance(
                PlayerId::new(a.player_id),
                CourseId::new(a.course_id),
                AttendanceRecord {
                    session_date: a.session_date,
                    present: a.present,
                },
            )?;
        }
        for a in seed.assessments {
            directory.record_assessment(
                AcademyId::new(a.academy_id),
                PlayerId::new(a.player_id),
                Assessment {
                    na_score: a.na_score,
                    taken_at: a.taken_at,
                },
            )?;
        }
        Ok(directory)
    }

    pub fn add_member(&self, academy: AcademyId, user: ActorId, role: Role) -> SourceResult<()> {
        self.write("membership")?.roles.insert((academy, user), role);
        Ok(())
    }

    pub fn enroll(&self, academy: AcademyId, player: PlayerId, course: CourseId) -> SourceResult<()> {
        let mut state = self.write("enrollment")?;
        let courses = state.enrollments.entry((academy, player)).or_default();
        if !courses.contains(&course) {
            courses.push(course);
        }
        Ok(())
    }

    pub fn record_attendance(
        &self,
        player: PlayerId,
        course: CourseId,
        record: AttendanceRecord,
    ) -> SourceResult<()> {
        self.write("attendance")?
            .attendance
            .entry((player, course))
            .or_default()
            .push(record);
        Ok(())
    }

    pub fn record_assessment(
        &self,
        academy: AcademyId,
        player: PlayerId,
        assessment: Assessment,
    ) -> SourceResult<()> {
        self.write("assessment")?
            .assessments
            .entry((academy, player))
            .or_default()
            .push(assessment);
        Ok(())
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn read(&self, source_name: &'static str) -> SourceResult<RwLockReadGuard<'_, DirectoryState>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable(source_name, "directory offline"));
        }
        self.state
            .read()
            .map_err(|_| SourceError::unavailable(source_name, "directory lock poisoned"))
    }

    fn write(&self, source_name: &'static str) -> SourceResult<RwLockWriteGuard<'_, DirectoryState>> {
        self.state
            .write()
            .map_err(|_| SourceError::unavailable(source_name, "directory lock poisoned"))
    }
}

#[async_trait]
impl AssessmentSource for InMemoryDirectory {
    async fn latest_assessment(
        &self,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> SourceResult<Option<Assessment>> {
        let state = self.read("assessment")?;
        Ok(state
            .assessments
            .get(&(academy.clone(), player.clone()))
            .and_then(|all| all.iter().max_by_key(|a| a.taken_at))
            .cloned())
    }
}

#[async_trait]
impl AttendanceSource for InMemoryDirectory {
    async fn attendance_records(
        &self,
        player: &PlayerId,
        course: &CourseId,
    ) -> SourceResult<Vec<AttendanceRecord>> {
        let state = self.read("attendance")?;
        Ok(state
            .attendance
            .get(&(player.clone(), course.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl EnrollmentDirectory for InMemoryDirectory {
    async fn enrolled_courses(
        &self,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> SourceResult<Vec<CourseId>> {
        let state = self.read("enrollment")?;
        Ok(state
            .enrollments
            .get(&(academy.clone(), player.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryDirectory {
    async fn role_of(
        &self,
        actor: &ActorId,
        academy: &AcademyId,
    ) -> progression_guard::error::Result<Option<Role>> {
        let state = self
            .read("membership")
            .map_err(|e| GuardError::Directory(e.to_string()))?;
        Ok(state.roles.get(&(academy.clone(), actor.clone())).copied())
    }

    async fn is_member(
        &self,
        player: &PlayerId,
        academy: &AcademyId,
    ) -> progression_guard::error::Result<bool> {
        let state = self
            .read("membership")
            .map_err(|e| GuardError::Directory(e.to_string()))?;
        Ok(state
            .roles
            .contains_key(&(academy.clone(), ActorId::new(player.as_str()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn north() -> AcademyId {
        AcademyId::new("north")
    }

    #[tokio::test]
    async fn test_latest_assessment_wins_by_date() {
        let directory = InMemoryDirectory::new();
        let t0 = Utc::now();
        for (score, offset) in [(60.0, 0), (72.0, 20), (65.0, 10)] {
            directory
                .record_assessment(
                    north(),
                    PlayerId::new("p-1"),
                    Assessment {
                        na_score: score,
                        taken_at: t0 + Duration::days(offset),
                    },
                )
                .unwrap();
        }
        let latest = directory
            .latest_assessment(&north(), &PlayerId::new("p-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.na_score, 72.0);
        assert!(directory
            .latest_assessment(&AcademyId::new("south"), &PlayerId::new("p-1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_membership_lookup() {
        let directory = InMemoryDirectory::new();
        directory
            .add_member(north(), ActorId::new("coach-1"), Role::Coach)
            .unwrap();
        directory
            .add_member(north(), ActorId::new("p-1"), Role::Member)
            .unwrap();

        assert_eq!(
            directory.role_of(&ActorId::new("coach-1"), &north()).await.unwrap(),
            Some(Role::Coach)
        );
        assert!(directory.is_member(&PlayerId::new("p-1"), &north()).await.unwrap());
        assert!(!directory
            .is_member(&PlayerId::new("p-1"), &AcademyId::new("south"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_directory_fails_lookups() {
        let directory = InMemoryDirectory::new();
        directory.set_unavailable(true);
        assert!(directory
            .enrolled_courses(&north(), &PlayerId::new("p-1"))
            .await
            .is_err());
        assert!(matches!(
            directory.role_of(&ActorId::new("coach-1"), &north()).await,
            Err(GuardError::Directory(_))
        ));
    }

    #[test]
    fn test_seed_from_json() {
        let seed: DirectorySeed = serde_json::from_str(
            r#"{
                "memberships": [{"academy_id": "north", "user_id": "coach-1", "role": "coach"}],
                "enrollments": [{"academy_id": "north", "player_id": "p-1", "course_id": "u12"}],
                "attendance": [{"player_id": "p-1", "course_id": "u12", "session_date": "2026-02-01T17:00:00Z", "present": true}]
            }"#,
        )
        .unwrap();
        assert!(seed.assessments.is_empty());
        InMemoryDirectory::from_seed(seed).unwrap();
    }
}
