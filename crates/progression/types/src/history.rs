//! Append-only stage history.
//!
//! Entries are stored oldest-first. The only way to change a history is to
//! derive a new one from it, so earlier values stay valid for concurrent
//! readers and closed entries are never touched again.

use crate::ids::ActorId;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_na_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_na_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StageHistoryEntry {
    pub fn open(stage: Stage, started_at: DateTime<Utc>, entry_na_score: Option<f64>) -> Self {
        Self {
            stage,
            started_at,
            ended_at: None,
            approved_by: None,
            entry_na_score,
            exit_na_score: None,
            notes: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// An approved move to the next stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageTransition {
    pub to: Stage,
    pub at: DateTime<Utc>,
    pub approved_by: ActorId,
    /// Latest score, recorded as the exit score of the closed entry and the
    /// entry score of the new one.
    pub na_score: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HistoryError {
    #[error("stage history has no open entry")]
    NoOpenEntry,

    #[error("stage history out of sync: open entry is {open}, profile is at {current}")]
    OutOfSync { open: Stage, current: Stage },

    #[error("transition {from} -> {to} does not move forward")]
    NotForward { from: Stage, to: Stage },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageHistory(Vec<StageHistoryEntry>);

impl StageHistory {
    /// History with a single open entry.
    pub fn started(stage: Stage, at: DateTime<Utc>, entry_na_score: Option<f64>) -> Self {
        Self(vec![StageHistoryEntry::open(stage, at, entry_na_score)])
    }

    /// Oldest-first view.
    pub fn entries(&self) -> &[StageHistoryEntry] {
        &self.0
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &StageHistoryEntry> {
        self.0.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entry for the current stage.
    pub fn open_entry(&self) -> Option<&StageHistoryEntry> {
        self.0.last().filter(|entry| entry.is_open())
    }

    pub fn open_count(&self) -> usize {
        self.0.iter().filter(|entry| entry.is_open()).count()
    }

    /// Exactly one open entry, it is the newest and matches `current`, and
    /// stages strictly increase oldest-to-newest.
    pub fn is_consistent_with(&self, current: Stage) -> bool {
        let increasing = self.0.windows(2).all(|pair| pair[0].stage < pair[1].stage);
        let open_matches = self
            .open_entry()
            .map(|entry| entry.stage == current)
            .unwrap_or(false);
        increasing && open_matches && self.open_count() == 1
    }

    /// New history whose open entry carries `score` as its entry score, when
    /// none was recorded yet. Closed entries are carried over untouched.
    pub fn with_open_entry_score(&self, score: f64) -> Self {
        match self.open_entry() {
            Some(open) if open.entry_na_score.is_none() => {
                let backfilled = StageHistoryEntry {
                    entry_na_score: Some(score),
                    ..open.clone()
                };
                Self(self.closed_prefix().chain([backfilled]).collect())
            }
            _ => self.clone(),
        }
    }

    /// New history with the open entry closed and a fresh open entry for
    /// `transition.to` appended.
    pub fn advanced(&self, transition: &StageTransition) -> Result<Self, HistoryError> {
        let open = self.open_entry().ok_or(HistoryError::NoOpenEntry)?;
        if transition.to <= open.stage {
            return Err(HistoryError::NotForward {
                from: open.stage,
                to: transition.to,
            });
        }

        let closed = StageHistoryEntry {
            ended_at: Some(transition.at),
            approved_by: Some(transition.approved_by.clone()),
            exit_na_score: transition.na_score,
            notes: transition.notes.clone().or_else(|| open.notes.clone()),
            ..open.clone()
        };
        let opened = StageHistoryEntry::open(transition.to, transition.at, transition.na_score);

        Ok(Self(
            self.closed_prefix().chain([closed, opened]).collect(),
        ))
    }

    fn closed_prefix(&self) -> impl Iterator<Item = StageHistoryEntry> + '_ {
        let keep = if self.open_entry().is_some() {
            self.0.len() - 1
        } else {
            self.0.len()
        };
        self.0[..keep].iter().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn transition(to: Stage, at: DateTime<Utc>) -> StageTransition {
        StageTransition {
            to,
            at,
            approved_by: ActorId::new("coach-1"),
            na_score: Some(71.5),
            notes: Some("solid block".to_string()),
        }
    }

    #[test]
    fn test_started_history_has_one_open_entry() {
        let t0 = Utc::now();
        let history = StageHistory::started(Stage::Bronze, t0, None);
        assert_eq!(history.len(), 1);
        assert_eq!(history.open_count(), 1);
        assert!(history.is_consistent_with(Stage::Bronze));
        assert!(!history.is_consistent_with(Stage::Silver));
    }

    #[test]
    fn test_advance_closes_and_opens() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::days(40);
        let original = StageHistory::started(Stage::Bronze, t0, Some(60.0));
        let advanced = original.advanced(&transition(Stage::Silver, t1)).unwrap();

        // The source value is left as it was.
        assert_eq!(original.len(), 1);
        assert!(original.open_entry().is_some());

        let entries = advanced.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stage, Stage::Bronze);
        assert_eq!(entries[0].ended_at, Some(t1));
        assert_eq!(entries[0].approved_by, Some(ActorId::new("coach-1")));
        assert_eq!(entries[0].entry_na_score, Some(60.0));
        assert_eq!(entries[0].exit_na_score, Some(71.5));
        assert_eq!(entries[1].stage, Stage::Silver);
        assert_eq!(entries[1].started_at, t1);
        assert_eq!(entries[1].entry_na_score, Some(71.5));
        assert!(advanced.is_consistent_with(Stage::Silver));

        let newest: Vec<Stage> = advanced.newest_first().map(|e| e.stage).collect();
        assert_eq!(newest, vec![Stage::Silver, Stage::Bronze]);
    }

    #[test]
    fn test_advance_rejects_backwards_move() {
        let history = StageHistory::started(Stage::Gold, Utc::now(), None);
        let err = history
            .advanced(&transition(Stage::Silver, Utc::now()))
            .unwrap_err();
        assert_eq!(
            err,
            HistoryError::NotForward {
                from: Stage::Gold,
                to: Stage::Silver
            }
        );
    }

    #[test]
    fn test_backfill_only_when_unset() {
        let history = StageHistory::started(Stage::Bronze, Utc::now(), None);
        let filled = history.with_open_entry_score(55.0);
        assert_eq!(filled.open_entry().unwrap().entry_na_score, Some(55.0));

        let untouched = filled.with_open_entry_score(80.0);
        assert_eq!(untouched.open_entry().unwrap().entry_na_score, Some(55.0));
    }

    #[test]
    fn test_backfill_leaves_closed_entries() {
        let t0 = Utc::now();
        let mut t = transition(Stage::Silver, t0 + Duration::days(31));
        t.na_score = None;
        let history = StageHistory::started(Stage::Bronze, t0, None)
            .advanced(&t)
            .unwrap()
            .with_open_entry_score(64.0);
        assert_eq!(history.entries()[0].entry_na_score, None);
        assert_eq!(history.entries()[1].entry_na_score, Some(64.0));
    }
}
