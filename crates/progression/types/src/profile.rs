//! The per-(academy, player) progression profile.

use crate::history::{HistoryError, StageHistory, StageTransition};
use crate::ids::{AcademyId, PlayerId, ProfileKey};
use crate::ledger::{BadgeGrant, XpEvent};
use crate::stage::{AssessmentStatus, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progression state of one player inside one academy.
///
/// Scalar fields are public; the history and ledger collections can only grow
/// through the `with_*` / `advanced` builders, each of which returns a new
/// profile and leaves `self` untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressionProfile {
    pub academy_id: AcademyId,
    pub player_id: PlayerId,
    pub current_stage: Stage,
    pub stage_start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_entry_na_score: Option<f64>,
    stage_history: StageHistory,
    pub assessment_status: AssessmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assessment_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_key: Option<String>,
    #[serde(default)]
    xp_events: Vec<XpEvent>,
    #[serde(default)]
    badges: Vec<BadgeGrant>,
    /// Bumped by the store on every committed write.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressionProfile {
    /// Fresh Bronze profile with one open history entry and an empty ledger.
    pub fn new(key: ProfileKey, now: DateTime<Utc>) -> Self {
        Self {
            academy_id: key.academy_id,
            player_id: key.player_id,
            current_stage: Stage::Bronze,
            stage_start_date: now,
            stage_entry_na_score: None,
            stage_history: StageHistory::started(Stage::Bronze, now, None),
            assessment_status: AssessmentStatus::NeedsFirstAssessment,
            last_assessment_at: None,
            identity_key: None,
            xp_events: Vec::new(),
            badges: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> ProfileKey {
        ProfileKey::new(self.academy_id.clone(), self.player_id.clone())
    }

    pub fn stage_history(&self) -> &StageHistory {
        &self.stage_history
    }

    pub fn xp_events(&self) -> &[XpEvent] {
        &self.xp_events
    }

    pub fn badges(&self) -> &[BadgeGrant] {
        &self.badges
    }

    pub fn total_points(&self) -> u64 {
        self.xp_events.iter().map(|e| u64::from(e.points)).sum()
    }

    /// Stage, start date and history agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.stage_history.is_consistent_with(self.current_stage)
            && self
                .stage_history
                .open_entry()
                .map(|entry| entry.started_at == self.stage_start_date)
                .unwrap_or(false)
    }

    pub fn with_xp_event(&self, event: XpEvent) -> Self {
        let mut next = self.clone();
        next.xp_events = self.xp_events.iter().cloned().chain([event]).collect();
        next
    }

    pub fn with_badge(&self, grant: BadgeGrant) -> Self {
        let mut next = self.clone();
        next.badges = self.badges.iter().cloned().chain([grant]).collect();
        next
    }

    /// Records `score` as the stage entry score where none exists yet, on the
    /// profile and on the open history entry. Existing values are kept.
    pub fn with_entry_score_backfilled(&self, score: f64) -> Self {
        let mut next = self.clone();
        if next.stage_entry_na_score.is_none() {
            next.stage_entry_na_score = Some(score);
        }
        next.stage_history = self.stage_history.with_open_entry_score(score);
        next
    }

    /// Applies an approved transition: closes the open history entry, opens
    /// the next one, and moves stage, start date, entry score and assessment
    /// status along with it.
    pub fn advanced(&self, transition: &StageTransition) -> Result<Self, HistoryError> {
        let open = self
            .stage_history
            .open_entry()
            .ok_or(HistoryError::NoOpenEntry)?;
        if open.stage != self.current_stage {
            return Err(HistoryError::OutOfSync {
                open: open.stage,
                current: self.current_stage,
            });
        }

        let mut next = self.clone();
        next.stage_history = self.stage_history.advanced(transition)?;
        next.current_stage = transition.to;
        next.stage_start_date = transition.at;
        next.stage_entry_na_score = transition.na_score;
        next.assessment_status = AssessmentStatus::StageEvaluation;
        Ok(next)
    }

    /// Stamps store bookkeeping on a profile about to be written.
    pub fn committed(mut self, revision: u64, at: DateTime<Utc>) -> Self {
        self.revision = revision;
        self.updated_at = at;
        self
    }
}

/// Field-merge update. Only supplied fields are written.
///
/// Stage, start date, history and ledger are deliberately absent: those move
/// together through [`ProgressionProfile::advanced`] and the ledger builders.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_entry_na_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_status: Option<AssessmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assessment_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_key: Option<String>,
}

impl ProfilePatch {
    pub fn identity_key(key: impl Into<String>) -> Self {
        Self {
            identity_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, profile: &ProgressionProfile) -> ProgressionProfile {
        let mut next = profile.clone();
        if let Some(score) = self.stage_entry_na_score {
            next.stage_entry_na_score = Some(score);
        }
        if let Some(status) = self.assessment_status {
            next.assessment_status = status;
        }
        if let Some(at) = self.last_assessment_at {
            next.last_assessment_at = Some(at);
        }
        if let Some(key) = &self.identity_key {
            next.identity_key = Some(key.clone());
        }
        next
    }
}
