//! Progress tracking boundary.
//!
//! The sequencer reports mastered scenarios through [`ProgressStore`]; where
//! the numbers end up is the embedding application's business.
//! [`MemoryProgress`] keeps them for the lifetime of the process.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Number of session entries kept; older ones are dropped first.
pub const SESSION_HISTORY_LIMIT: usize = 30;

/// One mastered scenario within a location visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Location visit the entry belongs to.
    pub session_id: Uuid,
    pub location_id: String,
    pub scenario_id: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub scenarios_completed: u64,
    #[serde(default)]
    pub completed_by_location: BTreeMap<String, u64>,
    pub emotions_recognized: u64,
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
}

impl ProgressSnapshot {
    /// Single-line JSON for whatever keeps the numbers between runs.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(CoreError::from)
    }
}

pub trait ProgressStore {
    /// Returns the new total of completed scenarios.
    fn record_scenario_completed(&mut self, location_id: &str) -> u64;
    fn record_emotion_recognized(&mut self) -> u64;
    fn record_session(&mut self, entry: SessionEntry);
    fn snapshot(&self) -> ProgressSnapshot;
}

impl<T: ProgressStore + ?Sized> ProgressStore for &mut T {
    fn record_scenario_completed(&mut self, location_id: &str) -> u64 {
        (**self).record_scenario_completed(location_id)
    }
    fn record_emotion_recognized(&mut self) -> u64 {
        (**self).record_emotion_recognized()
    }
    fn record_session(&mut self, entry: SessionEntry) {
        (**self).record_session(entry)
    }
    fn snapshot(&self) -> ProgressSnapshot {
        (**self).snapshot()
    }
}

impl<T: ProgressStore + ?Sized> ProgressStore for Box<T> {
    fn record_scenario_completed(&mut self, location_id: &str) -> u64 {
        (**self).record_scenario_completed(location_id)
    }
    fn record_emotion_recognized(&mut self) -> u64 {
        (**self).record_emotion_recognized()
    }
    fn record_session(&mut self, entry: SessionEntry) {
        (**self).record_session(entry)
    }
    fn snapshot(&self) -> ProgressSnapshot {
        (**self).snapshot()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryProgress {
    inner: ProgressSnapshot,
}

impl MemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from previously saved counters.
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self { inner: snapshot }
    }
}

impl ProgressStore for MemoryProgress {
    fn record_scenario_completed(&mut self, location_id: &str) -> u64 {
        self.inner.scenarios_completed += 1;
        *self
            .inner
            .completed_by_location
            .entry(location_id.to_string())
            .or_default() += 1;
        self.inner.scenarios_completed
    }

    fn record_emotion_recognized(&mut self) -> u64 {
        self.inner.emotions_recognized += 1;
        self.inner.emotions_recognized
    }

    fn record_session(&mut self, entry: SessionEntry) {
        self.inner.sessions.push(entry);
        let overflow = self.inner.sessions.len().saturating_sub(SESSION_HISTORY_LIMIT);
        if overflow > 0 {
            self.inner.sessions.drain(..overflow);
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        self.inner.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> SessionEntry {
        SessionEntry {
            session_id: Uuid::nil(),
            location_id: "home".into(),
            scenario_id: format!("scenario-{n}"),
            at: Utc::now(),
        }
    }

    #[test]
    fn counts_completions_per_location() {
        let mut progress = MemoryProgress::new();
        assert_eq!(progress.record_scenario_completed("home"), 1);
        assert_eq!(progress.record_scenario_completed("park"), 2);
        assert_eq!(progress.record_scenario_completed("home"), 3);
        let snap = progress.snapshot();
        assert_eq!(snap.completed_by_location["home"], 2);
        assert_eq!(snap.completed_by_location["park"], 1);
    }

    #[test]
    fn other_counters_are_independent() {
        let mut progress = MemoryProgress::new();
        progress.record_emotion_recognized();
        progress.record_emotion_recognized();
        let snap = progress.snapshot();
        assert_eq!(snap.emotions_recognized, 2);
        assert_eq!(snap.scenarios_completed, 0);
    }

    #[test]
    fn session_history_keeps_most_recent() {
        let mut progress = MemoryProgress::new();
        for n in 0..35 {
            progress.record_session(entry(n));
        }
        let sessions = progress.snapshot().sessions;
        assert_eq!(sessions.len(), SESSION_HISTORY_LIMIT);
        assert_eq!(sessions[0].scenario_id, "scenario-5");
        assert_eq!(sessions.last().unwrap().scenario_id, "scenario-34");
    }

    #[test]
    fn borrowed_store_records_into_owner() {
        fn record<P: ProgressStore>(mut store: P) -> u64 {
            store.record_scenario_completed("store")
        }

        let mut progress = MemoryProgress::new();
        assert_eq!(record(&mut progress), 1);
        assert_eq!(record(Box::new(&mut progress)), 2);
        assert_eq!(progress.snapshot().completed_by_location["store"], 2);
    }

    #[test]
    fn snapshot_json_restores_counters() {
        let mut progress = MemoryProgress::new();
        progress.record_scenario_completed("park");
        progress.record_session(entry(1));
        let json = progress.snapshot().to_json().unwrap();

        let restored: ProgressSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, progress.snapshot());
        let mut resumed = MemoryProgress::from_snapshot(restored);
        assert_eq!(resumed.record_scenario_completed("park"), 2);
    }
}
