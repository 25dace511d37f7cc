//! Stage ladder and assessment status.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// One of the five ordered skill tiers.
///
/// The derived ordering is the promotion order: `Bronze < Silver < ... < Diamond`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Stage {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Stage {
    /// Every stage, lowest first.
    pub const ALL: [Stage; 5] = [
        Stage::Bronze,
        Stage::Silver,
        Stage::Gold,
        Stage::Platinum,
        Stage::Diamond,
    ];

    /// Zero-based rank in the ladder.
    pub fn rank(self) -> usize {
        self as usize
    }

    /// The stage a promotion leads to, `None` at the ceiling.
    pub fn next(self) -> Option<Stage> {
        Self::ALL.get(self.rank() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Bronze => "Bronze",
            Stage::Silver => "Silver",
            Stage::Gold => "Gold",
            Stage::Platinum => "Platinum",
            Stage::Diamond => "Diamond",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown stage: {0}")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// Where the player sits in the assessment cycle. Only the orchestrator sets it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssessmentStatus {
    #[default]
    NeedsFirstAssessment,
    FirstAssessmentCompleted,
    Reassessment,
    StageEvaluation,
}

/// Kind of organization an academy is; drives the minimum dwell time per stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    /// Monthly cadence.
    #[default]
    Academy,
    /// Seasonal cadence.
    Club,
    /// Per-term cadence.
    School,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ladder() {
        assert_eq!(Stage::Bronze.next(), Some(Stage::Silver));
        assert_eq!(Stage::Platinum.next(), Some(Stage::Diamond));
        assert_eq!(Stage::Diamond.next(), None);
        assert!(Stage::Diamond.is_terminal());
        assert!(!Stage::Gold.is_terminal());
    }

    #[test]
    fn test_stage_ordering_matches_rank() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].rank() + 1, pair[1].rank());
        }
    }

    #[test]
    fn test_stage_parse() {
        assert_eq!("gold".parse::<Stage>(), Ok(Stage::Gold));
        assert_eq!(" Diamond ".parse::<Stage>(), Ok(Stage::Diamond));
        assert!("mythril".parse::<Stage>().is_err());
    }

    #[test]
    fn test_defaults_are_entry_states() {
        assert_eq!(Stage::default(), Stage::Bronze);
        assert_eq!(AssessmentStatus::default(), AssessmentStatus::NeedsFirstAssessment);
        assert_eq!(OrganizationType::default(), OrganizationType::Academy);
    }

    #[test]
    fn test_organization_type_serde() {
        let json = serde_json::to_string(&OrganizationType::School).unwrap();
        assert_eq!(json, "\"school\"");
    }
}
