//! Orchestrator configuration

use progression_rules::StageRuleConfig;
use progression_types::{AcademyId, OrganizationType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Promotion thresholds
    #[serde(default)]
    pub rules: StageRuleConfig,

    /// Organization type of academies missing from `organization_types`
    #[serde(default)]
    pub default_organization_type: OrganizationType,

    /// Per-academy organization type, keyed by academy id
    #[serde(default)]
    pub organization_types: BTreeMap<String, OrganizationType>,

    /// Optimistic write attempts per mutation before a conflict is reported
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
}

impl ServiceConfig {
    pub fn organization_type_of(&self, academy: &AcademyId) -> OrganizationType {
        self.organization_types
            .get(academy.as_str())
            .copied()
            .unwrap_or(self.default_organization_type)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rules: StageRuleConfig::default(),
            default_organization_type: OrganizationType::default(),
            organization_types: BTreeMap::new(),
            max_commit_attempts: default_max_commit_attempts(),
        }
    }
}

fn default_max_commit_attempts() -> u32 {
    5
}
