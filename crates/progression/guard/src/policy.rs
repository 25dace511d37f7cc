//! Role/operation policy table
//!
//! Every role-based decision is a lookup in one table keyed by
//! `(Role, Operation)`, so the whole matrix can be listed and tested.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Functional role of a membership record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Coach,
    /// Players, guardians and other plain members.
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Coach, Role::Member];
}

/// Operations the progression surface exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ViewProfile,
    Evaluate,
    SyncAssessment,
    ApproveUpgrade,
    GrantBadge,
    SetIdentityKey,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::ViewProfile,
        Operation::Evaluate,
        Operation::SyncAssessment,
        Operation::ApproveUpgrade,
        Operation::GrantBadge,
        Operation::SetIdentityKey,
    ];

    /// Operations that change a profile.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Operation::ViewProfile | Operation::Evaluate)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Allowed `(role, operation)` pairs. Anything absent is denied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyTable {
    allowed: BTreeSet<(Role, Operation)>,
}

impl PolicyTable {
    /// Table that denies everything.
    pub fn empty() -> Self {
        Self {
            allowed: BTreeSet::new(),
        }
    }

    /// Administrators and coaches may do everything; plain members may read.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for operation in Operation::ALL {
            table = table
                .allow(Role::Administrator, operation)
                .allow(Role::Coach, operation);
        }
        table
            .allow(Role::Member, Operation::ViewProfile)
            .allow(Role::Member, Operation::Evaluate)
    }

    pub fn allow(mut self, role: Role, operation: Operation) -> Self {
        self.allowed.insert((role, operation));
        self
    }

    pub fn revoke(mut self, role: Role, operation: Operation) -> Self {
        self.allowed.remove(&(role, operation));
        self
    }

    pub fn allows(&self, role: Role, operation: Operation) -> bool {
        self.allowed.contains(&(role, operation))
    }

    /// Every `(role, operation)` cell with its verdict.
    pub fn matrix(&self) -> Vec<(Role, Operation, bool)> {
        Role::ALL
            .into_iter()
            .flat_map(|role| {
                Operation::ALL
                    .into_iter()
                    .map(move |op| (role, op, self.allows(role, op)))
            })
            .collect()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}
