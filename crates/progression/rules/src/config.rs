//! Thresholds for the stage rules

use progression_types::OrganizationType;
use serde::{Deserialize, Serialize};

/// Minimum days a player stays in a stage, per organization type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellThresholds {
    #[serde(default = "default_academy_days")]
    pub academy_days: i64,
    #[serde(default = "default_club_days")]
    pub club_days: i64,
    #[serde(default = "default_school_days")]
    pub school_days: i64,
}

impl DwellThresholds {
    pub fn days_for(&self, organization: OrganizationType) -> i64 {
        match organization {
            OrganizationType::Academy => self.academy_days,
            OrganizationType::Club => self.club_days,
            OrganizationType::School => self.school_days,
        }
    }
}

impl Default for DwellThresholds {
    fn default() -> Self {
        Self {
            academy_days: default_academy_days(),
            club_days: default_club_days(),
            school_days: default_school_days(),
        }
    }
}

/// Stage rule configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageRuleConfig {
    #[serde(default)]
    pub min_dwell: DwellThresholds,

    /// Fraction of sessions attended since the stage began, in `[0, 1]`.
    #[serde(default = "default_min_attendance_rate")]
    pub min_attendance_rate: f64,

    /// Required `current - entry` NA score difference.
    #[serde(default)]
    pub min_score_improvement: f64,
}

impl Default for StageRuleConfig {
    fn default() -> Self {
        Self {
            min_dwell: DwellThresholds::default(),
            min_attendance_rate: default_min_attendance_rate(),
            min_score_improvement: 0.0,
        }
    }
}

fn default_academy_days() -> i64 {
    30
}

fn default_club_days() -> i64 {
    60
}

fn default_school_days() -> i64 {
    90
}

fn default_min_attendance_rate() -> f64 {
    0.7
}
