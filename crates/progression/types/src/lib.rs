//! Progression Types - stages, profiles and the records that audit them
//!
//! Shared vocabulary for the academy progression crates: the ordered stage
//! ladder, the per-(academy, player) profile, its append-only stage history
//! and the gamification ledger entries embedded in it.

#![deny(unsafe_code)]

mod actor;
mod history;
mod ids;
mod ledger;
mod profile;
mod stage;

pub use actor::ActorContext;
pub use history::{HistoryError, StageHistory, StageHistoryEntry, StageTransition};
pub use ids::{AcademyId, ActorId, BadgeId, CourseId, PlayerId, ProfileKey, XpEventId};
pub use ledger::{BadgeGrant, XpEvent, XpEventType};
pub use profile::{ProfilePatch, ProgressionProfile};
pub use stage::{AssessmentStatus, OrganizationType, ParseStageError, Stage};
