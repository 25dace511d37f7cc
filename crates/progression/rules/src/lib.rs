//! Stage Rule Evaluator
//!
//! Computes whether a player is eligible for the next stage from the current
//! profile state and freshly gathered signals. Pure and deterministic: the
//! evaluation time is an input, nothing is read or written. A positive
//! verdict is advisory; promotion still needs an explicit approval.
//!
//! ## Rules (all must pass)
//!
//! 1. Dwell time: at least the per-organization minimum since the stage began.
//! 2. Score: the current NA score must not fall below the entry score. A
//!    missing current score is flagged but does not block.
//! 3. Attendance: the attendance rate must reach the configured floor.
//! 4. Ceiling: the top stage has no next stage.

#![deny(unsafe_code)]

mod config;

pub use config::{DwellThresholds, StageRuleConfig};

use chrono::{DateTime, Utc};
use progression_types::{OrganizationType, Stage};
use serde::{Deserialize, Serialize};

/// Why a verdict is what it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// Minimum dwell time not yet reached.
    TooEarly,
    /// Current NA score is below the stage entry score.
    ScoreRegressed,
    /// No current NA score; the score rule is inconclusive.
    NoRecentAssessment,
    LowAttendance,
    /// Already at the top stage.
    MaxStageReached,
}

impl Reason {
    /// Blocking reasons make a verdict ineligible; the rest are flags.
    pub fn is_blocking(self) -> bool {
        !matches!(self, Reason::NoRecentAssessment)
    }
}

/// Everything the rules look at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageInput {
    pub current_stage: Stage,
    pub stage_start_date: DateTime<Utc>,
    pub organization_type: OrganizationType,
    pub stage_entry_na_score: Option<f64>,
    pub current_na_score: Option<f64>,
    pub attendance_rate: f64,
    /// Point in time the dwell rule is measured against.
    pub as_of: DateTime<Utc>,
}

/// Verdict plus the figures it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub eligible: bool,
    /// In rule order.
    pub reasons: Vec<Reason>,
    pub next_stage: Option<Stage>,
    pub days_in_stage: i64,
    pub required_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_delta: Option<f64>,
    pub attendance_rate: f64,
}

impl Evaluation {
    pub fn has_reason(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    pub fn blocking_reasons(&self) -> impl Iterator<Item = Reason> + '_ {
        self.reasons.iter().copied().filter(|r| r.is_blocking())
    }
}

/// Evaluate promotion eligibility.
pub fn evaluate_stage(config: &StageRuleConfig, input: &StageInput) -> Evaluation {
    let mut reasons = Vec::new();

    let required_days = config.min_dwell.days_for(input.organization_type);
    let in_stage = input.as_of.signed_duration_since(input.stage_start_date);
    // Dwell must strictly exceed the threshold.
    if in_stage <= chrono::Duration::days(required_days) {
        reasons.push(Reason::TooEarly);
    }

    let score_delta = match (input.stage_entry_na_score, input.current_na_score) {
        (Some(entry), Some(current)) => Some(current - entry),
        _ => None,
    };
    match (input.current_na_score, score_delta) {
        (None, _) => reasons.push(Reason::NoRecentAssessment),
        (Some(_), Some(delta)) if delta < config.min_score_improvement => {
            reasons.push(Reason::ScoreRegressed)
        }
        _ => {}
    }

    if !(input.attendance_rate >= config.min_attendance_rate) {
        reasons.push(Reason::LowAttendance);
    }

    let next_stage = input.current_stage.next();
    if next_stage.is_none() {
        reasons.push(Reason::MaxStageReached);
    }

    Evaluation {
        eligible: !reasons.iter().any(|r| r.is_blocking()),
        reasons,
        next_stage,
        days_in_stage: in_stage.num_days(),
        required_days,
        score_delta,
        attendance_rate: input.attendance_rate,
    }
}
