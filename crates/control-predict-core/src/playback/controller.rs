//! Playback controller implementation.
//!
//! Like the countdown, the controller is a clock-driven state machine with no
//! internal thread. Every command takes the caller's clock reading in
//! milliseconds. Timers are armed in a single [`OneShot`] slot and delivered
//! either by `tick(now_ms)` or by handing a token back to `fire()`. Starting,
//! aborting and each new phase replace the slot, so a token from a superseded
//! phase or play-through is ignored.
//!
//! ## Usage
//!
//! ```ignore
//! let mut playback = PlaybackController::new(PlaybackConfig::default());
//! playback.start(scenario, now)?;
//! // In a loop:
//! while let Some(event) = playback.tick(now) { /* render */ }
//! // When the child picks an answer:
//! playback.select_choice_id("light-off", now);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::PlaybackConfig;
use super::phase::Phase;
use crate::error::ValidationError;
use crate::events::PlaybackEvent;
use crate::scenario::{Choice, Scenario};
use crate::timer::{Deadline, OneShot, TimerKind, TimerToken};

/// Mutable state of one play-through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub phase: Phase,
    pub selected_choice: Option<Choice>,
    /// Derived once a choice is made.
    pub correct_choice: Option<Choice>,
}

#[derive(Debug, Clone)]
pub struct PlaybackController {
    config: PlaybackConfig,
    scenario: Option<Scenario>,
    state: PlaybackState,
    timer: OneShot,
    /// Incremented by every successful `start()`.
    playthrough: u64,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            scenario: None,
            state: PlaybackState::default(),
            timer: OneShot::new(),
            playthrough: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    pub fn selected_choice(&self) -> Option<&Choice> {
        self.state.selected_choice.as_ref()
    }

    pub fn correct_choice(&self) -> Option<&Choice> {
        self.state.correct_choice.as_ref()
    }

    /// Identifies the current play-through; changes on every `start()`.
    pub fn playthrough_id(&self) -> u64 {
        self.playthrough
    }

    pub fn pending_timer(&self) -> Option<Deadline> {
        self.timer.pending()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timer.pending().map(|d| d.due_at_ms)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a play-through of `scenario`.
    ///
    /// A play-through still in flight is aborted first; its pending timer
    /// is dropped without firing.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for malformed records, leaving the
    /// controller untouched.
    pub fn start(&mut self, scenario: Scenario, now_ms: u64) -> Result<PlaybackEvent, ValidationError> {
        scenario.validate()?;
        match scenario.correct_choice_count() {
            1 => {}
            0 => warn!(scenario_id = %scenario.id, "scenario has no correct choice"),
            n => warn!(scenario_id = %scenario.id, count = n, "scenario has several correct choices"),
        }

        if !self.state.phase.can_transition_to(Phase::Intro) {
            self.abort();
        }
        self.timer.cancel();
        self.state.selected_choice = None;
        self.state.correct_choice = None;
        self.transition(Phase::Intro);
        self.playthrough = self.playthrough.wrapping_add(1);

        let duration_ms = self.config.scaled_duration(scenario.duration_ms);
        let (pause_in_ms, _) = scenario.segments(duration_ms);
        self.timer.arm(TimerKind::PausePoint, now_ms, pause_in_ms);

        let scenario_id = scenario.id.clone();
        self.scenario = Some(scenario);
        Ok(PlaybackEvent::Started {
            scenario_id,
            pause_in_ms,
            at: Utc::now(),
        })
    }

    /// Record the child's prediction. See [`select_choice_id`](Self::select_choice_id).
    pub fn select_choice(&mut self, choice: &Choice, now_ms: u64) -> Option<PlaybackEvent> {
        self.select_choice_id(&choice.id, now_ms)
    }

    /// Record the child's prediction by choice id.
    ///
    /// Only honoured while paused for prediction and only once per
    /// play-through; every other call is ignored. The choice is looked up in
    /// the active scenario, so ids from other scenarios are ignored too.
    pub fn select_choice_id(&mut self, choice_id: &str, now_ms: u64) -> Option<PlaybackEvent> {
        if self.state.phase != Phase::PausedForPrediction || self.state.selected_choice.is_some() {
            debug!(phase = %self.state.phase, choice_id, "choice ignored");
            return None;
        }
        let scenario = self.scenario.as_ref()?;
        let Some(selected) = scenario.choice(choice_id).cloned() else {
            debug!(scenario_id = %scenario.id, choice_id, "choice not part of scenario");
            return None;
        };
        let correct = scenario.correct_choice().cloned();
        let duration_ms = self.config.scaled_duration(scenario.duration_ms);
        let (_, completes_in_ms) = scenario.segments(duration_ms);
        let scenario_id = scenario.id.clone();

        if !self.transition(Phase::Resolving) {
            return None;
        }
        self.state.selected_choice = Some(selected.clone());
        self.state.correct_choice = correct.clone();
        self.timer.arm(TimerKind::Completion, now_ms, completes_in_ms);

        Some(PlaybackEvent::ChoiceRecorded {
            scenario_id,
            selected,
            correct,
            completes_in_ms,
            at: Utc::now(),
        })
    }

    /// Branch on the recorded prediction once the outcome has been shown.
    ///
    /// A missing correct choice counts as a wrong answer; the reveal then
    /// carries no correct choice.
    pub fn acknowledge_outcome(&mut self, now_ms: u64) -> Option<PlaybackEvent> {
        if self.state.phase != Phase::Outcome {
            debug!(phase = %self.state.phase, "acknowledge ignored");
            return None;
        }
        // Drops a pending outcome-hold timer.
        self.timer.cancel();
        let scenario_id = self.scenario.as_ref().map(|s| s.id.clone()).unwrap_or_default();

        match self.state.selected_choice.clone() {
            Some(selected) if selected.is_correct => {
                self.transition(Phase::CorrectDone);
                Some(PlaybackEvent::ScenarioMastered {
                    scenario_id,
                    selected,
                    at: Utc::now(),
                })
            }
            selected => {
                self.transition(Phase::IncorrectReveal);
                self.timer.arm(TimerKind::Reveal, now_ms, self.config.reveal_ms);
                Some(PlaybackEvent::Revealed {
                    scenario_id,
                    selected,
                    correct: self.state.correct_choice.clone(),
                    at: Utc::now(),
                })
            }
        }
    }

    /// Cancel everything and return to idle. Emits nothing.
    pub fn abort(&mut self) -> bool {
        self.timer.cancel();
        if self.state.phase == Phase::Idle {
            return false;
        }
        self.transition(Phase::Idle);
        self.state.selected_choice = None;
        self.state.correct_choice = None;
        true
    }

    /// Deliver the pending timer if it is due at `now_ms`.
    ///
    /// Returns at most one event; call again until `None` to drain timers
    /// that chain with zero delay.
    pub fn tick(&mut self, now_ms: u64) -> Option<PlaybackEvent> {
        let deadline = self.timer.take_due(now_ms)?;
        self.on_timer(deadline.token.kind(), deadline.due_at_ms)
    }

    /// Deliver a timer by token, e.g. from an external scheduler.
    ///
    /// Tokens that are no longer armed (cancelled, superseded or already
    /// fired) are ignored.
    pub fn fire(&mut self, token: TimerToken, now_ms: u64) -> Option<PlaybackEvent> {
        if self.timer.take_if_current(token).is_none() {
            debug!(kind = ?token.kind(), generation = token.generation(), "stale timer ignored");
            return None;
        }
        self.on_timer(token.kind(), now_ms)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn on_timer(&mut self, kind: TimerKind, at_ms: u64) -> Option<PlaybackEvent> {
        let scenario_id = self.scenario.as_ref()?.id.clone();
        match kind {
            TimerKind::PausePoint => {
                self.transition(Phase::PausedForPrediction).then(|| PlaybackEvent::Paused {
                    scenario_id,
                    at: Utc::now(),
                })
            }
            TimerKind::Completion => {
                if !self.transition(Phase::Outcome) {
                    return None;
                }
                if let Some(hold_ms) = self.config.outcome_hold_ms {
                    self.timer.arm(TimerKind::OutcomeHold, at_ms, hold_ms);
                }
                Some(PlaybackEvent::Completed {
                    scenario_id,
                    selected: self.state.selected_choice.clone(),
                    correct: self.state.correct_choice.clone(),
                    at: Utc::now(),
                })
            }
            TimerKind::OutcomeHold => self.acknowledge_outcome(at_ms),
            TimerKind::Reveal => {
                self.transition(Phase::AdvancePending).then(|| PlaybackEvent::AdvanceReady {
                    scenario_id,
                    correct: self.state.correct_choice.clone(),
                    at: Utc::now(),
                })
            }
            TimerKind::Advance => {
                warn!("advance timer delivered to playback controller");
                None
            }
        }
    }

    fn transition(&mut self, next: Phase) -> bool {
        let current = self.state.phase;
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "rejected phase transition");
            return false;
        }
        debug!(from = %current, to = %next, "phase transition");
        self.state.phase = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::fixtures::{door_closing, light_switch};

    #[test]
    fn correct_path_reaches_correct_done() {
        let mut pc = PlaybackController::default();
        let started = pc.start(light_switch(), 0).unwrap();
        assert!(matches!(started, PlaybackEvent::Started { pause_in_ms: 1_000, .. }));
        assert_eq!(pc.phase(), Phase::Intro);

        assert!(pc.tick(999).is_none());
        assert!(matches!(pc.tick(1_000), Some(PlaybackEvent::Paused { .. })));
        assert_eq!(pc.phase(), Phase::PausedForPrediction);

        let recorded = pc.select_choice_id("light-off", 1_000).unwrap();
        assert!(matches!(recorded, PlaybackEvent::ChoiceRecorded { completes_in_ms: 1_000, .. }));
        assert_eq!(pc.phase(), Phase::Resolving);

        assert!(pc.tick(1_999).is_none());
        assert!(matches!(pc.tick(2_000), Some(PlaybackEvent::Completed { .. })));
        assert_eq!(pc.phase(), Phase::Outcome);

        assert!(matches!(
            pc.acknowledge_outcome(2_100),
            Some(PlaybackEvent::ScenarioMastered { .. })
        ));
        assert_eq!(pc.phase(), Phase::CorrectDone);
        assert!(pc.next_deadline().is_none());
    }

    #[test]
    fn incorrect_path_reveals_then_advances() {
        let mut pc = PlaybackController::default();
        pc.start(door_closing(), 0).unwrap();
        assert!(matches!(pc.tick(1_000), Some(PlaybackEvent::Paused { .. })));
        pc.select_choice_id("door-open", 1_000).unwrap();
        assert!(pc.tick(2_499).is_none());
        assert!(matches!(pc.tick(2_500), Some(PlaybackEvent::Completed { .. })));

        match pc.acknowledge_outcome(2_500) {
            Some(PlaybackEvent::Revealed { correct, .. }) => {
                assert_eq!(correct.unwrap().id, "door-close");
            }
            other => panic!("expected Revealed, got {other:?}"),
        }
        assert_eq!(pc.phase(), Phase::IncorrectReveal);
        assert_eq!(pc.correct_choice().unwrap().id, "door-close");

        assert!(pc.tick(4_999).is_none());
        assert!(matches!(pc.tick(5_000), Some(PlaybackEvent::AdvanceReady { .. })));
        assert_eq!(pc.phase(), Phase::AdvancePending);
    }

    #[test]
    fn second_choice_is_ignored() {
        let mut pc = PlaybackController::default();
        pc.start(light_switch(), 0).unwrap();
        pc.tick(1_000);
        pc.select_choice_id("light-on", 1_000).unwrap();
        assert!(pc.select_choice_id("light-off", 1_100).is_none());
        assert_eq!(pc.selected_choice().unwrap().id, "light-on");

        pc.tick(2_000);
        assert!(pc.select_choice_id("light-off", 2_000).is_none());
        assert_eq!(pc.selected_choice().unwrap().id, "light-on");
    }

    #[test]
    fn choice_before_pause_is_ignored() {
        let mut pc = PlaybackController::default();
        assert!(pc.select_choice_id("light-off", 0).is_none());
        pc.start(light_switch(), 0).unwrap();
        assert!(pc.select_choice_id("light-off", 500).is_none());
        assert_eq!(pc.phase(), Phase::Intro);
        assert!(pc.selected_choice().is_none());
    }

    #[test]
    fn foreign_choice_is_ignored() {
        let mut pc = PlaybackController::default();
        pc.start(light_switch(), 0).unwrap();
        pc.tick(1_000);
        let foreign = Choice::new("door-close", "Closes", "🚪", true);
        assert!(pc.select_choice(&foreign, 1_000).is_none());
        assert_eq!(pc.phase(), Phase::PausedForPrediction);
    }

    #[test]
    fn missing_correct_choice_degrades_to_incorrect() {
        let mut scenario = light_switch();
        for choice in &mut scenario.choices {
            choice.is_correct = false;
        }
        let mut pc = PlaybackController::default();
        pc.start(scenario, 0).unwrap();
        pc.tick(1_000);
        pc.select_choice_id("light-off", 1_000).unwrap();
        pc.tick(2_000);
        match pc.acknowledge_outcome(2_000) {
            Some(PlaybackEvent::Revealed { correct, .. }) => assert!(correct.is_none()),
            other => panic!("expected Revealed, got {other:?}"),
        }
        assert_eq!(pc.phase(), Phase::IncorrectReveal);
    }

    #[test]
    fn zero_pause_point_still_pauses() {
        let mut scenario = light_switch();
        scenario.pause_point = 0;
        let mut pc = PlaybackController::default();
        pc.start(scenario, 50).unwrap();
        assert_eq!(pc.phase(), Phase::Intro);
        assert_eq!(pc.next_deadline(), Some(50));
        assert!(matches!(pc.tick(50), Some(PlaybackEvent::Paused { .. })));
    }

    #[test]
    fn full_pause_point_completes_immediately() {
        let mut scenario = light_switch();
        scenario.pause_point = 100;
        let mut pc = PlaybackController::default();
        pc.start(scenario, 0).unwrap();
        pc.tick(2_000);
        pc.select_choice_id("light-off", 2_000).unwrap();
        assert_eq!(pc.phase(), Phase::Resolving);
        assert!(matches!(pc.tick(2_000), Some(PlaybackEvent::Completed { .. })));
    }

    #[test]
    fn abort_cancels_pending_timer() {
        let mut pc = PlaybackController::default();
        pc.start(light_switch(), 0).unwrap();
        let token = pc.pending_timer().unwrap().token;
        assert!(pc.abort());
        assert_eq!(pc.phase(), Phase::Idle);
        assert!(pc.fire(token, 1_000).is_none());
        assert!(pc.tick(10_000).is_none());
        assert!(!pc.abort());
    }

    #[test]
    fn stale_token_cannot_touch_new_playthrough() {
        let mut pc = PlaybackController::default();
        pc.start(light_switch(), 0).unwrap();
        let stale = pc.pending_timer().unwrap().token;
        pc.start(door_closing(), 10).unwrap();
        assert!(pc.fire(stale, 1_000).is_none());
        assert_eq!(pc.phase(), Phase::Intro);
        assert_eq!(pc.scenario().unwrap().id, "door-closing");
    }

    #[test]
    fn restart_mid_flight_aborts_first() {
        let mut pc = PlaybackController::default();
        pc.start(light_switch(), 0).unwrap();
        pc.tick(1_000);
        pc.select_choice_id("light-on", 1_000);
        let first = pc.playthrough_id();
        pc.start(light_switch(), 1_200).unwrap();
        assert_ne!(pc.playthrough_id(), first);
        assert_eq!(pc.phase(), Phase::Intro);
        assert!(pc.selected_choice().is_none());
        assert_eq!(pc.next_deadline(), Some(2_200));
    }

    #[test]
    fn invalid_scenario_leaves_state_untouched() {
        let mut pc = PlaybackController::default();
        pc.start(light_switch(), 0).unwrap();
        let mut broken = door_closing();
        broken.duration_ms = 0;
        assert!(pc.start(broken, 100).is_err());
        assert_eq!(pc.phase(), Phase::Intro);
        assert_eq!(pc.scenario().unwrap().id, "light-switch");
    }

    #[test]
    fn outcome_hold_acknowledges_automatically() {
        let config = PlaybackConfig {
            outcome_hold_ms: Some(2_500),
            ..PlaybackConfig::default()
        };
        let mut pc = PlaybackController::new(config);
        pc.start(light_switch(), 0).unwrap();
        pc.tick(1_000);
        pc.select_choice_id("light-off", 1_000);
        pc.tick(2_000);
        assert_eq!(pc.phase(), Phase::Outcome);
        assert!(pc.tick(4_499).is_none());
        assert!(matches!(pc.tick(4_500), Some(PlaybackEvent::ScenarioMastered { .. })));
    }

    #[test]
    fn manual_acknowledge_cancels_outcome_hold() {
        let config = PlaybackConfig {
            outcome_hold_ms: Some(2_500),
            ..PlaybackConfig::default()
        };
        let mut pc = PlaybackController::new(config);
        pc.start(door_closing(), 0).unwrap();
        pc.tick(1_000);
        pc.select_choice_id("door-open", 1_000);
        pc.tick(2_500);
        let hold = pc.pending_timer().unwrap().token;
        assert_eq!(hold.kind(), TimerKind::OutcomeHold);
        pc.acknowledge_outcome(3_000).unwrap();
        assert!(pc.fire(hold, 5_000).is_none());
        assert_eq!(pc.pending_timer().unwrap().token.kind(), TimerKind::Reveal);
        assert_eq!(pc.next_deadline(), Some(5_500));
    }

    #[test]
    fn acknowledge_outside_outcome_is_ignored() {
        let mut pc = PlaybackController::default();
        assert!(pc.acknowledge_outcome(0).is_none());
        pc.start(light_switch(), 0).unwrap();
        assert!(pc.acknowledge_outcome(0).is_none());
        assert_eq!(pc.phase(), Phase::Intro);
    }

    #[test]
    fn slow_speed_stretches_both_segments() {
        let config = PlaybackConfig {
            animation_speed: crate::playback::AnimationSpeed::Slow,
            ..PlaybackConfig::default()
        };
        let mut pc = PlaybackController::new(config);
        pc.start(light_switch(), 0).unwrap();
        assert_eq!(pc.next_deadline(), Some(1_500));
        pc.tick(1_500);
        pc.select_choice_id("light-off", 1_500);
        assert_eq!(pc.next_deadline(), Some(3_000));
    }
}
