//! Walks a location's scenarios in order.
//!
//! The sequencer owns one [`PlaybackController`] and decides what happens
//! once a play-through ends:
//!
//! - mastered: record progress and wait for the child to replay or move on;
//! - wrong answer: after the reveal, move to the next scenario on its own,
//!   following a short settle delay, or go back to the selection screen after
//!   the last one.
//!
//! Like the controller it is driven by the caller's clock: feed it `tick(now)`
//! and sleep until `next_deadline()`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::ScenarioCatalog;
use crate::events::{PlaybackEvent, SequencerEvent};
use crate::playback::{Phase, PlaybackConfig, PlaybackController};
use crate::progress::{ProgressStore, SessionEntry};
use crate::scenario::Scenario;
use crate::timer::{OneShot, TimerKind, TimerToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceMode {
    Selecting,
    Playing,
}

pub struct ScenarioSequencer<P: ProgressStore> {
    location_id: String,
    session_id: Uuid,
    scenarios: Vec<Scenario>,
    active_index: usize,
    mode: SequenceMode,
    playback: PlaybackController,
    advance_timer: OneShot,
    config: PlaybackConfig,
    /// Play-through whose outcome has already been handled.
    handled_playthrough: Option<u64>,
    progress: P,
}

impl<P: ProgressStore> ScenarioSequencer<P> {
    pub fn new(
        location_id: impl Into<String>,
        scenarios: Vec<Scenario>,
        config: PlaybackConfig,
        progress: P,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            session_id: Uuid::new_v4(),
            scenarios,
            active_index: 0,
            mode: SequenceMode::Selecting,
            playback: PlaybackController::new(config.clone()),
            advance_timer: OneShot::new(),
            config,
            handled_playthrough: None,
            progress,
        }
    }

    /// Open a location: the scenario list is read once from the catalog.
    pub fn from_catalog<C: ScenarioCatalog + ?Sized>(
        catalog: &C,
        location_id: &str,
        config: PlaybackConfig,
        progress: P,
    ) -> Self {
        Self::new(location_id, catalog.list_scenarios(location_id), config, progress)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn mode(&self) -> SequenceMode {
        self.mode
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn active_scenario(&self) -> Option<&Scenario> {
        match self.mode {
            SequenceMode::Playing => self.scenarios.get(self.active_index),
            SequenceMode::Selecting => None,
        }
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn phase(&self) -> Phase {
        self.playback.phase()
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Leave the location, handing back the progress store.
    pub fn into_progress(mut self) -> P {
        self.exit();
        self.progress
    }

    /// Earliest clock reading at which `tick()` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        let advance = self.advance_timer.pending().map(|d| d.due_at_ms);
        match (self.playback.next_deadline(), advance) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// True once the replay / next buttons should be offered.
    pub fn awaiting_decision(&self) -> bool {
        self.mode == SequenceMode::Playing && self.playback.phase() == Phase::CorrectDone
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Show the selection screen. Nothing plays until `select()`.
    pub fn enter_selection(&mut self) {
        self.advance_timer.cancel();
        self.playback.abort();
        self.mode = SequenceMode::Selecting;
    }

    /// Start the scenario at `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize, now_ms: u64) -> Vec<SequencerEvent> {
        if index >= self.scenarios.len() {
            debug!(index, len = self.scenarios.len(), "selection out of range");
            return Vec::new();
        }
        self.advance_timer.cancel();
        self.active_index = index;
        self.mode = SequenceMode::Playing;
        let mut events = vec![SequencerEvent::ScenarioSelected {
            index,
            scenario_id: self.scenarios[index].id.clone(),
            at: Utc::now(),
        }];
        events.extend(self.start_active(now_ms));
        events
    }

    pub fn select_choice(&mut self, choice_id: &str, now_ms: u64) -> Vec<SequencerEvent> {
        if self.mode != SequenceMode::Playing {
            return Vec::new();
        }
        self.playback
            .select_choice_id(choice_id, now_ms)
            .map(|event| self.wrap(event))
            .into_iter()
            .collect()
    }

    pub fn acknowledge_outcome(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        if self.mode != SequenceMode::Playing {
            return Vec::new();
        }
        match self.playback.acknowledge_outcome(now_ms) {
            Some(event) => self.handle_playback_event(event, now_ms),
            None => Vec::new(),
        }
    }

    /// React to a play-through that reached a terminal phase.
    ///
    /// Each play-through is handled once; repeated calls and calls in
    /// non-terminal phases do nothing.
    pub fn on_outcome_acknowledged(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        let playthrough = self.playback.playthrough_id();
        if self.mode != SequenceMode::Playing || self.handled_playthrough == Some(playthrough) {
            return Vec::new();
        }
        match self.playback.phase() {
            Phase::CorrectDone => {
                self.handled_playthrough = Some(playthrough);
                let scenario_id = self
                    .scenarios
                    .get(self.active_index)
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                let total = self.progress.record_scenario_completed(&self.location_id);
                self.progress.record_session(SessionEntry {
                    session_id: self.session_id,
                    location_id: self.location_id.clone(),
                    scenario_id,
                    at: Utc::now(),
                });
                info!(location = %self.location_id, total, "scenario mastered");
                vec![SequencerEvent::ProgressRecorded {
                    location_id: self.location_id.clone(),
                    scenarios_completed: total,
                    at: Utc::now(),
                }]
            }
            Phase::AdvancePending => {
                self.handled_playthrough = Some(playthrough);
                self.advance(now_ms)
            }
            _ => Vec::new(),
        }
    }

    /// Play the current scenario again. Only after a mastered outcome.
    pub fn replay_current(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        if !self.awaiting_decision() {
            return Vec::new();
        }
        self.start_active(now_ms)
    }

    /// Move on after a mastered outcome, same rule as the automatic advance.
    pub fn advance_or_exit(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        if !self.awaiting_decision() {
            return Vec::new();
        }
        self.advance(now_ms)
    }

    /// Drop every pending timer; used when leaving the location.
    pub fn exit(&mut self) {
        self.advance_timer.cancel();
        self.playback.abort();
        self.mode = SequenceMode::Selecting;
        self.active_index = 0;
    }

    /// Deliver every timer due at `now_ms`, earliest first.
    pub fn tick(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        loop {
            let playback_due = self
                .playback
                .pending_timer()
                .filter(|d| d.due_at_ms <= now_ms);
            let advance_due = self
                .advance_timer
                .pending()
                .filter(|d| d.due_at_ms <= now_ms);

            let next = match (playback_due, advance_due) {
                (Some(p), Some(a)) if a.due_at_ms < p.due_at_ms => a,
                (Some(p), _) => p,
                (None, Some(a)) => a,
                (None, None) => break,
            };
            events.extend(self.fire(next.token, next.due_at_ms));
        }
        events
    }

    /// Deliver a timer by token. Stale tokens are ignored.
    pub fn fire(&mut self, token: TimerToken, now_ms: u64) -> Vec<SequencerEvent> {
        if token.kind() == TimerKind::Advance {
            if self.advance_timer.take_if_current(token).is_none() {
                debug!(generation = token.generation(), "stale advance timer ignored");
                return Vec::new();
            }
            return self.start_active(now_ms);
        }
        match self.playback.fire(token, now_ms) {
            Some(event) => self.handle_playback_event(event, now_ms),
            None => Vec::new(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn wrap(&self, event: PlaybackEvent) -> SequencerEvent {
        SequencerEvent::Playback {
            index: self.active_index,
            event,
        }
    }

    fn handle_playback_event(&mut self, event: PlaybackEvent, now_ms: u64) -> Vec<SequencerEvent> {
        let terminal = event.is_terminal();
        let mut events = vec![self.wrap(event)];
        if terminal {
            events.extend(self.on_outcome_acknowledged(now_ms));
        }
        events
    }

    fn start_active(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        let Some(scenario) = self.scenarios.get(self.active_index).cloned() else {
            return Vec::new();
        };
        let index = self.active_index;
        let scenario_id = scenario.id.clone();
        match self.playback.start(scenario, now_ms) {
            Ok(event) => vec![self.wrap(event)],
            Err(err) => {
                warn!(index, scenario_id = %scenario_id, error = %err, "scenario rejected");
                self.playback.abort();
                self.mode = SequenceMode::Selecting;
                vec![SequencerEvent::ScenarioRejected {
                    index,
                    scenario_id,
                    reason: err.to_string(),
                    at: Utc::now(),
                }]
            }
        }
    }

    fn advance(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        self.playback.abort();
        if self.active_index + 1 < self.scenarios.len() {
            let from_index = self.active_index;
            self.active_index += 1;
            let delay_ms = self.config.advance_delay_ms;
            self.advance_timer.arm(TimerKind::Advance, now_ms, delay_ms);
            vec![SequencerEvent::AdvanceScheduled {
                from_index,
                to_index: self.active_index,
                delay_ms,
                at: Utc::now(),
            }]
        } else {
            self.advance_timer.cancel();
            self.mode = SequenceMode::Selecting;
            self.active_index = 0;
            vec![SequencerEvent::ReturnedToSelection { at: Utc::now() }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgress;
    use crate::scenario::fixtures::{door_closing, light_switch};

    fn sequencer() -> ScenarioSequencer<MemoryProgress> {
        ScenarioSequencer::new(
            "home",
            vec![light_switch(), door_closing()],
            PlaybackConfig::default(),
            MemoryProgress::new(),
        )
    }

    #[test]
    fn starts_in_selection() {
        let seq = sequencer();
        assert_eq!(seq.mode(), SequenceMode::Selecting);
        assert!(seq.active_scenario().is_none());
        assert!(seq.next_deadline().is_none());
    }

    #[test]
    fn out_of_range_select_is_ignored() {
        let mut seq = sequencer();
        assert!(seq.select(2, 0).is_empty());
        assert!(seq.select(usize::MAX, 0).is_empty());
        assert_eq!(seq.mode(), SequenceMode::Selecting);
        assert_eq!(seq.active_index(), 0);
    }

    #[test]
    fn select_starts_playback() {
        let mut seq = sequencer();
        let events = seq.select(1, 0);
        assert!(matches!(events[0], SequencerEvent::ScenarioSelected { index: 1, .. }));
        assert!(matches!(
            events[1],
            SequencerEvent::Playback {
                index: 1,
                event: PlaybackEvent::Started { .. }
            }
        ));
        assert_eq!(seq.mode(), SequenceMode::Playing);
        assert_eq!(seq.phase(), Phase::Intro);
        assert_eq!(seq.active_scenario().unwrap().id, "door-closing");
    }

    #[test]
    fn mastered_records_progress_once_and_waits() {
        let mut seq = sequencer();
        seq.select(0, 0);
        seq.tick(1_000);
        seq.select_choice("light-off", 1_000);
        seq.tick(2_000);
        let events = seq.acknowledge_outcome(2_000);
        assert!(events
            .iter()
            .any(|e| matches!(e, SequencerEvent::ProgressRecorded { scenarios_completed: 1, .. })));
        assert!(seq.awaiting_decision());
        assert!(seq.on_outcome_acknowledged(2_100).is_empty());
        assert_eq!(seq.progress().snapshot().scenarios_completed, 1);
        assert_eq!(seq.progress().snapshot().sessions.len(), 1);
        assert!(seq.tick(60_000).is_empty());
        assert_eq!(seq.active_index(), 0);
    }

    #[test]
    fn replay_restarts_same_scenario() {
        let mut seq = sequencer();
        assert!(seq.replay_current(0).is_empty());
        seq.select(0, 0);
        seq.tick(1_000);
        seq.select_choice("light-off", 1_000);
        seq.tick(2_000);
        seq.acknowledge_outcome(2_000);
        let events = seq.replay_current(3_000);
        assert_eq!(events.len(), 1);
        assert_eq!(seq.phase(), Phase::Intro);
        assert_eq!(seq.active_index(), 0);
        assert!(seq.replay_current(3_000).is_empty());
    }

    #[test]
    fn wrong_answer_auto_advances_after_delay() {
        let mut seq = sequencer();
        seq.select(0, 0);
        seq.tick(1_000);
        seq.select_choice("light-on", 1_000);
        seq.tick(2_000);
        seq.acknowledge_outcome(2_000);
        assert_eq!(seq.phase(), Phase::IncorrectReveal);

        let events = seq.tick(4_500);
        assert!(events
            .iter()
            .any(|e| matches!(e, SequencerEvent::AdvanceScheduled { from_index: 0, to_index: 1, .. })));
        assert_eq!(seq.active_index(), 1);
        assert_eq!(seq.phase(), Phase::Idle);
        assert_eq!(seq.next_deadline(), Some(4_800));

        let events = seq.tick(4_800);
        assert!(matches!(
            events[0],
            SequencerEvent::Playback {
                index: 1,
                event: PlaybackEvent::Started { .. }
            }
        ));
        assert_eq!(seq.phase(), Phase::Intro);
        assert_eq!(seq.progress().snapshot().scenarios_completed, 0);
    }

    #[test]
    fn wrong_answer_on_last_returns_to_selection() {
        let mut seq = sequencer();
        seq.select(1, 0);
        seq.tick(1_000);
        seq.select_choice("door-open", 1_000);
        seq.tick(2_500);
        seq.acknowledge_outcome(2_500);
        let events = seq.tick(5_000);
        assert!(matches!(events.last(), Some(SequencerEvent::ReturnedToSelection { .. })));
        assert_eq!(seq.mode(), SequenceMode::Selecting);
        assert_eq!(seq.active_index(), 0);
        assert!(seq.next_deadline().is_none());
    }

    #[test]
    fn advance_or_exit_only_after_mastery() {
        let mut seq = sequencer();
        seq.select(0, 0);
        assert!(seq.advance_or_exit(0).is_empty());
        seq.tick(1_000);
        seq.select_choice("light-off", 1_000);
        seq.tick(2_000);
        seq.acknowledge_outcome(2_000);
        let events = seq.advance_or_exit(2_500);
        assert!(matches!(events[0], SequencerEvent::AdvanceScheduled { to_index: 1, .. }));
        seq.tick(2_800);
        assert_eq!(seq.active_scenario().unwrap().id, "door-closing");
        assert_eq!(seq.phase(), Phase::Intro);
    }

    #[test]
    fn entering_selection_cancels_pending_advance() {
        let mut seq = sequencer();
        seq.select(0, 0);
        seq.tick(1_000);
        seq.select_choice("light-on", 1_000);
        seq.tick(2_000);
        seq.acknowledge_outcome(2_000);
        seq.tick(4_500);
        assert!(seq.next_deadline().is_some());
        seq.enter_selection();
        assert!(seq.next_deadline().is_none());
        assert!(seq.tick(10_000).is_empty());
        assert_eq!(seq.mode(), SequenceMode::Selecting);
    }

    #[test]
    fn invalid_scenario_is_rejected_back_to_selection() {
        let mut broken = door_closing();
        broken.choices.clear();
        let mut seq = ScenarioSequencer::new(
            "home",
            vec![broken],
            PlaybackConfig::default(),
            MemoryProgress::new(),
        );
        let events = seq.select(0, 0);
        assert!(matches!(events.last(), Some(SequencerEvent::ScenarioRejected { .. })));
        assert_eq!(seq.mode(), SequenceMode::Selecting);
        assert_eq!(seq.phase(), Phase::Idle);
    }

    #[test]
    fn choices_ignored_while_selecting() {
        let mut seq = sequencer();
        assert!(seq.select_choice("light-off", 0).is_empty());
        assert!(seq.acknowledge_outcome(0).is_empty());
    }

    #[test]
    fn into_progress_hands_back_store() {
        let mut seq = sequencer();
        seq.select(0, 0);
        seq.tick(1_000);
        seq.select_choice("light-off", 1_000);
        seq.tick(2_000);
        seq.acknowledge_outcome(2_000);
        let progress = seq.into_progress();
        assert_eq!(progress.snapshot().completed_by_location["home"], 1);
    }
}
