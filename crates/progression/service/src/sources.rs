//! Read-only collaborators the orchestrator pulls signals from.
//!
//! Assessments, attendance and enrollments are owned by other subsystems.
//! Failures are reported as [`SourceError`] and never replaced by defaults:
//! a made-up zero attendance rate would wrongly block a promotion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use progression_types::{AcademyId, BadgeId, CourseId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("{source_name} unavailable: {message}")]
    Unavailable {
        source_name: &'static str,
        message: String,
    },
}

impl SourceError {
    pub fn unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        SourceError::Unavailable {
            source_name,
            message: message.into(),
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Outcome of one physical/skill assessment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub na_score: f64,
    pub taken_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_date: DateTime<Utc>,
    pub present: bool,
}

#[async_trait]
pub trait AssessmentSource: Send + Sync {
    /// Most recent assessment of the player in the academy.
    async fn latest_assessment(
        &self,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> SourceResult<Option<Assessment>>;
}

#[async_trait]
pub trait AttendanceSource: Send + Sync {
    async fn attendance_records(
        &self,
        player: &PlayerId,
        course: &CourseId,
    ) -> SourceResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait EnrollmentDirectory: Send + Sync {
    async fn enrolled_courses(
        &self,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> SourceResult<Vec<CourseId>>;
}

pub trait BadgeRegistry: Send + Sync {
    fn is_known_badge(&self, badge: &BadgeId) -> bool;
}

/// Badges every academy can award.
pub const STANDARD_BADGES: [&str; 8] = [
    "first-assessment",
    "perfect-attendance",
    "most-improved",
    "team-player",
    "leadership",
    "fair-play",
    "endurance",
    "technical-excellence",
];

/// Fixed badge catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticBadgeRegistry {
    badges: BTreeSet<BadgeId>,
}

impl StaticBadgeRegistry {
    pub fn standard() -> Self {
        Self {
            badges: STANDARD_BADGES.iter().map(|b| BadgeId::new(*b)).collect(),
        }
    }

    pub fn with_badges<I, S>(mut self, badges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.badges.extend(badges.into_iter().map(BadgeId::new));
        self
    }

    pub fn badges(&self) -> impl Iterator<Item = &BadgeId> {
        self.badges.iter()
    }
}

impl Default for StaticBadgeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl BadgeRegistry for StaticBadgeRegistry {
    fn is_known_badge(&self, badge: &BadgeId) -> bool {
        self.badges.contains(badge)
    }
}
