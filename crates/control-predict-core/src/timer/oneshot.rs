//! Owned one-shot timers guarded by a generation counter.
//!
//! Nothing here sleeps. An owner arms a timer, gets back a [`TimerToken`], and
//! later either delivers that token (from whatever scheduler it uses) or lets
//! [`OneShot::take_due`] find it on a clock reading. Arming or cancelling bumps
//! the generation, so a token handed out before that point can never match
//! again: late deliveries are inert by construction.

use serde::{Deserialize, Serialize};

/// What a pending timer will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Intro segment done; pause for the prediction.
    PausePoint,
    /// Post-decision segment done; show the outcome.
    Completion,
    /// Outcome badge dismisses itself.
    OutcomeHold,
    /// Correct answer has been shown long enough.
    Reveal,
    /// Sequencer starts the next scenario.
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    generation: u64,
    kind: TimerKind,
}

impl TimerToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub token: TimerToken,
    /// Caller clock reading (ms) at which the timer is due.
    pub due_at_ms: u64,
}

/// Single-slot timer owner. At most one timer is pending at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneShot {
    generation: u64,
    pending: Option<Deadline>,
}

impl OneShot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> Option<Deadline> {
        self.pending
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Arm a timer, replacing (and thereby cancelling) any pending one.
    pub fn arm(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        let token = TimerToken {
            generation: self.generation,
            kind,
        };
        self.pending = Some(Deadline {
            token,
            due_at_ms: now_ms.saturating_add(delay_ms),
        });
        token
    }

    /// Drop the pending timer and invalidate every outstanding token.
    pub fn cancel(&mut self) -> Option<Deadline> {
        self.generation = self.generation.wrapping_add(1);
        self.pending.take()
    }

    /// Consume the pending timer if `token` is the one currently armed.
    pub fn take_if_current(&mut self, token: TimerToken) -> Option<Deadline> {
        match self.pending {
            Some(deadline) if deadline.token == token => self.pending.take(),
            _ => None,
        }
    }

    /// Consume the pending timer if it is due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Option<Deadline> {
        match self.pending {
            Some(deadline) if deadline.due_at_ms <= now_ms => self.pending.take(),
            _ => None,
        }
    }
}
