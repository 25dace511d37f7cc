//! The progression orchestrator

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::error::{ProgressionError, Result};
use crate::memory::InMemoryDirectory;
use crate::sources::{
    Assessment, AssessmentSource, AttendanceSource, BadgeRegistry, EnrollmentDirectory,
};
use chrono::{DateTime, Utc};
use progression_guard::{AccessGuard, Authorization, Operation};
use progression_ledger::{with_badge, with_xp_event, LedgerSummary};
use progression_rules::{evaluate_stage, Evaluation, StageInput};
use progression_store::{mutate_profile, ProfileStore};
use progression_types::{
    AcademyId, ActorContext, AssessmentStatus, BadgeGrant, BadgeId, OrganizationType, PlayerId,
    ProfileKey, ProfilePatch, ProgressionProfile, Stage, StageTransition, XpEvent, XpEventType,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The external collaborators the orchestrator reads from.
#[derive(Clone)]
pub struct Sources {
    pub assessments: Arc<dyn AssessmentSource>,
    pub attendance: Arc<dyn AttendanceSource>,
    pub enrollments: Arc<dyn EnrollmentDirectory>,
    pub badges: Arc<dyn BadgeRegistry>,
}

impl Sources {
    /// All signal sources served by one in-memory directory.
    pub fn in_memory(directory: Arc<InMemoryDirectory>, badges: Arc<dyn BadgeRegistry>) -> Self {
        Self {
            assessments: directory.clone(),
            attendance: directory.clone(),
            enrollments: directory,
            badges,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveUpgradeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Stage the approver saw; the approval fails if the profile moved on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_stage: Option<Stage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantBadgeRequest {
    pub badge_id: BadgeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl GrantBadgeRequest {
    pub fn new(badge_id: impl Into<String>) -> Self {
        Self {
            badge_id: BadgeId::new(badge_id),
            notes: None,
            idempotency_key: None,
        }
    }
}

/// Eligibility verdict plus the raw signals it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub academy_id: AcademyId,
    pub player_id: PlayerId,
    pub current_stage: Stage,
    pub stage_start_date: DateTime<Utc>,
    pub organization_type: OrganizationType,
    pub evaluation: Evaluation,
    pub sessions_total: usize,
    pub sessions_attended: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_assessment: Option<Assessment>,
    pub evaluated_at: DateTime<Utc>,
}

/// Coordinates guard, store, ledger, rules and signal sources.
///
/// Every operation authorizes first and touches nothing else on denial.
/// Every mutation is a single compare-and-swap commit.
pub struct ProgressionService {
    store: Arc<dyn ProfileStore>,
    guard: AccessGuard,
    sources: Sources,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl ProgressionService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        guard: AccessGuard,
        sources: Sources,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            guard,
            sources,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Record the player's latest assessment: status transition, XP award
    /// and entry-score backfill in one commit.
    ///
    /// The award carries the key `assessment:<taken_at>`, so syncing the same
    /// assessment again awards nothing and keeps the status; it only moves
    /// `last_assessment_at`.
    pub async fn sync_after_assessment(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> Result<ProgressionProfile> {
        self.authorize(actor, academy, player, Operation::SyncAssessment)
            .await?;

        let key = ProfileKey::new(academy.clone(), player.clone());
        let assessment = self
            .sources
            .assessments
            .latest_assessment(academy, player)
            .await?
            .ok_or_else(|| ProgressionError::NotFound(format!("no assessment for {key}")))?;

        let now = self.clock.now();
        self.store.ensure(&key, now).await?;

        let idempotency_key = format!("assessment:{}", assessment.taken_at.to_rfc3339());
        let profile = mutate_profile(
            self.store.as_ref(),
            &key,
            self.config.max_commit_attempts,
            |current| {
                let (status, event_type) = match current.assessment_status {
                    AssessmentStatus::NeedsFirstAssessment => (
                        AssessmentStatus::FirstAssessmentCompleted,
                        XpEventType::FirstAssessment,
                    ),
                    _ => (AssessmentStatus::Reassessment, XpEventType::Reassessment),
                };
                let patch = ProfilePatch {
                    assessment_status: Some(status),
                    last_assessment_at: Some(now),
                    ..Default::default()
                };
                let next = patch
                    .apply_to(current)
                    .with_entry_score_backfilled(assessment.na_score);
                let event = XpEvent::new(event_type, actor.actor_id.clone(), now)
                    .with_meta("naScore", assessment.na_score.to_string())
                    .with_idempotency_key(idempotency_key.clone());
                // A replayed assessment only refreshes the sync stamp.
                let synced = with_xp_event(&next, event).unwrap_or_else(|| {
                    ProfilePatch {
                        last_assessment_at: Some(now),
                        ..Default::default()
                    }
                    .apply_to(current)
                });
                Ok::<_, ProgressionError>(Some(synced))
            },
        )
        .await?;

        info!(
            academy = %academy,
            player = %player,
            status = ?profile.assessment_status,
            na_score = assessment.na_score,
            total_points = profile.total_points(),
            "Synced assessment"
        );
        Ok(profile)
    }

    /// Compute promotion eligibility from fresh signals. Never writes beyond
    /// creating a missing profile, and only once every signal was read.
    pub async fn evaluate(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> Result<EvaluationReport> {
        self.authorize(actor, academy, player, Operation::Evaluate)
            .await?;

        let mut records = Vec::new();
        for course in self
            .sources
            .enrollments
            .enrolled_courses(academy, player)
            .await?
        {
            records.extend(
                self.sources
                    .attendance
                    .attendance_records(player, &course)
                    .await?,
            );
        }
        let latest_assessment = self
            .sources
            .assessments
            .latest_assessment(academy, player)
            .await?;

        // Signals are in hand; only now may a missing profile be created.
        let now = self.clock.now();
        let key = ProfileKey::new(academy.clone(), player.clone());
        let profile = self.store.ensure(&key, now).await?;

        let mut sessions_total = 0;
        let mut sessions_attended = 0;
        for record in records
            .iter()
            .filter(|r| r.session_date >= profile.stage_start_date)
        {
            sessions_total += 1;
            if record.present {
                sessions_attended += 1;
            }
        }
        let attendance_rate = if sessions_total == 0 {
            0.0
        } else {
            sessions_attended as f64 / sessions_total as f64
        };
        let organization_type = self.config.organization_type_of(academy);

        let evaluation = evaluate_stage(
            &self.config.rules,
            &StageInput {
                current_stage: profile.current_stage,
                stage_start_date: profile.stage_start_date,
                organization_type,
                stage_entry_na_score: profile.stage_entry_na_score,
                current_na_score: latest_assessment.as_ref().map(|a| a.na_score),
                attendance_rate,
                as_of: now,
            },
        );

        debug!(
            academy = %academy,
            player = %player,
            stage = %profile.current_stage,
            eligible = evaluation.eligible,
            reasons = ?evaluation.reasons,
            sessions_total,
            sessions_attended,
            "Evaluated stage eligibility"
        );

        Ok(EvaluationReport {
            academy_id: academy.clone(),
            player_id: player.clone(),
            current_stage: profile.current_stage,
            stage_start_date: profile.stage_start_date,
            organization_type,
            evaluation,
            sessions_total,
            sessions_attended,
            latest_assessment,
            evaluated_at: now,
        })
    }

    /// Promote the player one stage.
    ///
    /// History, stage fields, assessment status and the `StageUpgrade` award
    /// are committed together. A concurrent approval that already moved the
    /// profile makes this one fail with `InvalidTransition` instead of
    /// advancing twice.
    pub async fn approve_upgrade(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
        request: ApproveUpgradeRequest,
    ) -> Result<ProgressionProfile> {
        self.authorize(actor, academy, player, Operation::ApproveUpgrade)
            .await?;

        let key = ProfileKey::new(academy.clone(), player.clone());
        let latest_score = self
            .sources
            .assessments
            .latest_assessment(academy, player)
            .await?
            .map(|a| a.na_score);

        let now = self.clock.now();
        self.store.ensure(&key, now).await?;

        let mut observed: Option<Stage> = request.expected_stage;
        let profile = mutate_profile(
            self.store.as_ref(),
            &key,
            self.config.max_commit_attempts,
            |current| {
                let from = current.current_stage;
                let seen = *observed.get_or_insert(from);
                if seen != from {
                    return Err(ProgressionError::InvalidTransition(format!(
                        "profile {key} is at {from}, approval was made against {seen}"
                    )));
                }
                let to = from.next().ok_or(ProgressionError::NoNextStage(from))?;

                let transition = StageTransition {
                    to,
                    at: now,
                    approved_by: actor.actor_id.clone(),
                    na_score: latest_score,
                    notes: request.notes.clone(),
                };
                let next = current
                    .advanced(&transition)
                    .map_err(|e| ProgressionError::InvalidTransition(e.to_string()))?;
                let event = XpEvent::new(XpEventType::StageUpgrade, actor.actor_id.clone(), now)
                    .with_meta("fromStage", from.as_str())
                    .with_meta("toStage", to.as_str());
                Ok(Some(next.with_xp_event(event)))
            },
        )
        .await
        .map_err(|err| {
            if matches!(
                err,
                ProgressionError::InvalidTransition(_) | ProgressionError::NoNextStage(_)
            ) {
                warn!(academy = %academy, player = %player, error = %err, "Upgrade rejected");
            }
            err
        })?;

        info!(
            academy = %academy,
            player = %player,
            stage = %profile.current_stage,
            approved_by = %actor.actor_id,
            "Approved stage upgrade"
        );
        Ok(profile)
    }

    /// Award a catalog badge together with its `BadgeGranted` points.
    pub async fn grant_badge(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
        request: GrantBadgeRequest,
    ) -> Result<ProgressionProfile> {
        self.authorize(actor, academy, player, Operation::GrantBadge)
            .await?;

        if !self.sources.badges.is_known_badge(&request.badge_id) {
            return Err(ProgressionError::UnknownBadge(request.badge_id));
        }

        let now = self.clock.now();
        let key = ProfileKey::new(academy.clone(), player.clone());
        self.store.ensure(&key, now).await?;

        let profile = mutate_profile(
            self.store.as_ref(),
            &key,
            self.config.max_commit_attempts,
            |current| {
                let grant = BadgeGrant::new(request.badge_id.clone(), actor.actor_id.clone(), now)
                    .with_notes(request.notes.clone())
                    .with_idempotency_key(request.idempotency_key.clone());
                let Some(granted) = with_badge(current, grant) else {
                    return Ok::<_, ProgressionError>(None);
                };
                let mut event = XpEvent::new(XpEventType::BadgeGranted, actor.actor_id.clone(), now)
                    .with_meta("badgeId", request.badge_id.as_str());
                if let Some(idempotency_key) = &request.idempotency_key {
                    event = event.with_idempotency_key(format!("badge:{idempotency_key}"));
                }
                Ok(Some(granted.with_xp_event(event)))
            },
        )
        .await?;

        info!(
            academy = %academy,
            player = %player,
            badge = %request.badge_id,
            granted_by = %actor.actor_id,
            "Granted badge"
        );
        Ok(profile)
    }

    /// Link the profile to an external identity. No ledger entry.
    pub async fn set_identity_key(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
        identity_key: String,
    ) -> Result<ProgressionProfile> {
        self.authorize(actor, academy, player, Operation::SetIdentityKey)
            .await?;

        let key = ProfileKey::new(academy.clone(), player.clone());
        self.store.ensure(&key, self.clock.now()).await?;
        let profile = self
            .store
            .update(&key, ProfilePatch::identity_key(identity_key))
            .await?
            .ok_or_else(|| ProgressionError::NotFound(key.to_string()))?;

        info!(academy = %academy, player = %player, "Set identity key");
        Ok(profile)
    }

    pub async fn profile(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> Result<ProgressionProfile> {
        self.authorize(actor, academy, player, Operation::ViewProfile)
            .await?;
        let key = ProfileKey::new(academy.clone(), player.clone());
        Ok(self.store.ensure(&key, self.clock.now()).await?)
    }

    pub async fn ledger_summary(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
    ) -> Result<LedgerSummary> {
        let profile = self.profile(actor, academy, player).await?;
        Ok(LedgerSummary::of(&profile))
    }

    async fn authorize(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        player: &PlayerId,
        operation: Operation,
    ) -> Result<()> {
        match self
            .guard
            .authorize(actor, academy, player, operation)
            .await?
        {
            Authorization::Authorized(_) => Ok(()),
            Authorization::Denied(reason) => Err(ProgressionError::NotAuthorized(reason)),
        }
    }
}
