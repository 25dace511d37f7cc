//! Gamification ledger entries embedded in a profile.

use crate::ids::{ActorId, BadgeId, XpEventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Points-bearing event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum XpEventType {
    FirstAssessment,
    Reassessment,
    BadgeGranted,
    StageUpgrade,
}

impl XpEventType {
    pub const ALL: [XpEventType; 4] = [
        XpEventType::FirstAssessment,
        XpEventType::Reassessment,
        XpEventType::BadgeGranted,
        XpEventType::StageUpgrade,
    ];

    /// Fixed reward for the event kind.
    pub fn points(self) -> u32 {
        match self {
            XpEventType::FirstAssessment => 50,
            XpEventType::Reassessment => 20,
            XpEventType::BadgeGranted => 10,
            XpEventType::StageUpgrade => 30,
        }
    }
}

impl std::fmt::Display for XpEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One immutable ledger line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XpEvent {
    pub event_id: XpEventId,
    pub event_type: XpEventType,
    pub points: u32,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
    /// Replays carrying the same key are not recorded twice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl XpEvent {
    /// Event carrying the fixed point value of its type.
    pub fn new(event_type: XpEventType, created_by: ActorId, created_at: DateTime<Utc>) -> Self {
        Self {
            event_id: XpEventId::generate(),
            event_type,
            points: event_type.points(),
            created_by,
            created_at,
            meta: BTreeMap::new(),
            idempotency_key: None,
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeGrant {
    pub badge_id: BadgeId,
    pub granted_by: ActorId,
    pub granted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl BadgeGrant {
    pub fn new(badge_id: BadgeId, granted_by: ActorId, granted_at: DateTime<Utc>) -> Self {
        Self {
            badge_id,
            granted_by,
            granted_at,
            notes: None,
            idempotency_key: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point_values() {
        assert_eq!(XpEventType::FirstAssessment.points(), 50);
        assert_eq!(XpEventType::Reassessment.points(), 20);
        assert_eq!(XpEventType::BadgeGranted.points(), 10);
        assert_eq!(XpEventType::StageUpgrade.points(), 30);
    }

    #[test]
    fn test_event_takes_points_from_type() {
        let event = XpEvent::new(XpEventType::StageUpgrade, ActorId::new("coach-1"), Utc::now())
            .with_meta("fromStage", "Bronze")
            .with_meta("toStage", "Silver");
        assert_eq!(event.points, 30);
        assert_eq!(event.meta.get("toStage").map(String::as_str), Some("Silver"));
        assert!(event.idempotency_key.is_none());
    }
}
