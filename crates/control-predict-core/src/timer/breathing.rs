//! Guided breathing: inhale, hold, exhale, repeated a few times.
//!
//! Each phase is its own countdown so the screen can show the seconds left.
//! A phase begins exactly when the previous one expired, so a late `tick()`
//! does not stretch the exercise.

use serde::{Deserialize, Serialize};

use super::countdown::{CountdownTimer, DEFAULT_TICK_INTERVAL_MS};
use crate::events::{BreathingEvent, CountdownEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

/// Phase lengths of one breath and how many breaths make an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingPattern {
    pub inhale_ms: u64,
    pub hold_ms: u64,
    pub exhale_ms: u64,
    pub cycles: u32,
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self {
            inhale_ms: 4_000,
            hold_ms: 2_000,
            exhale_ms: 4_000,
            cycles: 3,
        }
    }
}

impl BreathingPattern {
    pub fn phase_ms(&self, phase: BreathPhase) -> u64 {
        match phase {
            BreathPhase::Inhale => self.inhale_ms,
            BreathPhase::Hold => self.hold_ms,
            BreathPhase::Exhale => self.exhale_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreathingExercise {
    pattern: BreathingPattern,
    timer: CountdownTimer,
    phase: Option<BreathPhase>,
    cycles_completed: u32,
    finished: bool,
}

impl BreathingExercise {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self::with_interval(pattern, DEFAULT_TICK_INTERVAL_MS)
    }

    pub fn with_interval(pattern: BreathingPattern, interval_ms: u64) -> Self {
        Self {
            pattern,
            timer: CountdownTimer::new(interval_ms),
            phase: None,
            cycles_completed: 0,
            finished: false,
        }
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    pub fn phase(&self) -> Option<BreathPhase> {
        self.phase
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn remaining_ms(&self) -> u64 {
        self.timer.remaining_ms()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timer.next_deadline()
    }

    /// Begin with the first inhale. Restarts from scratch if already running.
    pub fn start(&mut self, now_ms: u64) -> Vec<BreathingEvent> {
        self.cycles_completed = 0;
        self.finished = false;
        if self.pattern.cycles == 0 {
            self.phase = None;
            self.finished = true;
            self.timer.cancel();
            return vec![BreathingEvent::Finished];
        }
        vec![self.enter(BreathPhase::Inhale, now_ms)]
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.phase = None;
        self.finished = true;
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<BreathingEvent> {
        let mut events = Vec::new();
        while let Some(phase) = self.phase {
            let mut expired = false;
            for event in self.timer.tick(now_ms) {
                match event {
                    CountdownEvent::Tick { remaining_ms } => {
                        events.push(BreathingEvent::Tick {
                            phase,
                            remaining_ms,
                        });
                    }
                    CountdownEvent::Expired => expired = true,
                }
            }
            if !expired {
                break;
            }
            let phase_end = self.timer.expired_at().unwrap_or(now_ms);
            match phase {
                BreathPhase::Inhale => events.push(self.enter(BreathPhase::Hold, phase_end)),
                BreathPhase::Hold => events.push(self.enter(BreathPhase::Exhale, phase_end)),
                BreathPhase::Exhale => {
                    self.cycles_completed += 1;
                    events.push(BreathingEvent::CycleCompleted {
                        count: self.cycles_completed,
                    });
                    if self.cycles_completed >= self.pattern.cycles {
                        self.phase = None;
                        self.finished = true;
                        events.push(BreathingEvent::Finished);
                    } else {
                        events.push(self.enter(BreathPhase::Inhale, phase_end));
                    }
                }
            }
        }
        events
    }

    fn enter(&mut self, phase: BreathPhase, at_ms: u64) -> BreathingEvent {
        let duration_ms = self.pattern.phase_ms(phase);
        self.phase = Some(phase);
        self.timer.start(duration_ms, at_ms);
        BreathingEvent::PhaseStarted {
            phase,
            cycle: self.cycles_completed + 1,
            duration_ms,
        }
    }
}
