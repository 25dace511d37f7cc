//! Access guard service

use crate::directory::MembershipDirectory;
use crate::error::Result;
use crate::policy::{Operation, PolicyTable, Role};
use progression_types::{AcademyId, ActorContext, PlayerId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// How an authorized actor got through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizedVia {
    PlatformAdmin,
    Membership(Role),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    /// The actor has no membership record in the academy.
    NotAMember,
    InsufficientRole { role: Role, operation: Operation },
    /// The target player does not belong to the academy.
    TargetNotInAcademy,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NotAMember => write!(f, "actor is not a member of the academy"),
            DenialReason::InsufficientRole { role, operation } => {
                write!(f, "role {} may not perform {}", role, operation)
            }
            DenialReason::TargetNotInAcademy => {
                write!(f, "target player is not a member of the academy")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    Authorized(AuthorizedVia),
    Denied(DenialReason),
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }
}

/// Tenant membership and role checks for every progression operation.
pub struct AccessGuard {
    directory: Arc<dyn MembershipDirectory>,
    policy: PolicyTable,
}

impl AccessGuard {
    /// Guard with the standard policy table.
    pub fn new(directory: Arc<dyn MembershipDirectory>) -> Self {
        Self {
            directory,
            policy: PolicyTable::standard(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Decide whether `actor` may perform `operation` on `target` in `academy`.
    pub async fn authorize(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        target: &PlayerId,
        operation: Operation,
    ) -> Result<Authorization> {
        let decision = self.decide(actor, academy, target, operation).await?;
        match &decision {
            Authorization::Authorized(via) => debug!(
                actor = %actor.actor_id,
                academy = %academy,
                player = %target,
                operation = %operation,
                via = ?via,
                "Access granted"
            ),
            Authorization::Denied(reason) => warn!(
                actor = %actor.actor_id,
                academy = %academy,
                player = %target,
                operation = %operation,
                reason = %reason,
                "Access denied"
            ),
        }
        Ok(decision)
    }

    async fn decide(
        &self,
        actor: &ActorContext,
        academy: &AcademyId,
        target: &PlayerId,
        operation: Operation,
    ) -> Result<Authorization> {
        if actor.platform_admin {
            return Ok(Authorization::Authorized(AuthorizedVia::PlatformAdmin));
        }

        let Some(role) = self.directory.role_of(&actor.actor_id, academy).await? else {
            return Ok(Authorization::Denied(DenialReason::NotAMember));
        };

        if !self.policy.allows(role, operation) {
            return Ok(Authorization::Denied(DenialReason::InsufficientRole {
                role,
                operation,
            }));
        }

        if !actor.actor_id.is_player(target) && !self.directory.is_member(target, academy).await?
        {
            return Ok(Authorization::Denied(DenialReason::TargetNotInAcademy));
        }

        Ok(Authorization::Authorized(AuthorizedVia::Membership(role)))
    }
}
