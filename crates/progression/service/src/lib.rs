//! Progression Service - the academy progression orchestrator
//!
//! Ties the access guard, profile store, ledger and stage rules to the
//! external signal sources:
//!
//! - `sync_after_assessment`: assessment status transition and XP award
//! - `evaluate`: read-only eligibility verdict with the raw signal counts
//! - `approve_upgrade`: the only stage transition, committed atomically
//! - `grant_badge` / `set_identity_key`: privileged profile updates
//!
//! Authorization always runs first; a denial has no side effects.

#![deny(unsafe_code)]

pub mod clock;
mod config;
pub mod error;
mod memory;
pub mod sources;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServiceConfig;
pub use error::ProgressionError;
pub use memory::{
    AssessmentSeed, AttendanceSeed, DirectorySeed, EnrollmentSeed, InMemoryDirectory,
    MembershipSeed,
};
pub use service::{
    ApproveUpgradeRequest, EvaluationReport, GrantBadgeRequest, ProgressionService, Sources,
};
pub use sources::{
    Assessment, AssessmentSource, AttendanceRecord, AttendanceSource, BadgeRegistry,
    EnrollmentDirectory, SourceError, StaticBadgeRegistry,
};

// Re-exported so callers can wire a service from this crate alone.
pub use progression_guard::{AccessGuard, DenialReason, MembershipDirectory, Operation, Role};
pub use progression_ledger::LedgerSummary;
pub use progression_rules::{Evaluation, Reason, StageRuleConfig};
pub use progression_store::{InMemoryProfileStore, ProfileStore, StorageError};
