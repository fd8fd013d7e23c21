//! Pausable countdown used by every visible timer (scenario, calming corner,
//! routine practice, breathing).
//!
//! Like the rest of the engine this is a clock-driven state machine without
//! threads: the caller passes its clock reading into `tick()`, which delivers
//! every interval boundary that has passed since the last call.
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |            |
//!            v            v
//!         Expired     Cancelled
//! ```

use serde::{Deserialize, Serialize};

use crate::events::CountdownEvent;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStatus {
    Idle,
    Running,
    Paused,
    Expired,
    Cancelled,
}

/// Receiver for the `on_tick` / `on_expire` pair screens hook into.
pub trait CountdownObserver {
    fn on_tick(&mut self, remaining_ms: u64);
    fn on_expire(&mut self);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownTimer {
    interval_ms: u64,
    duration_ms: u64,
    remaining_ms: u64,
    status: CountdownStatus,
    /// Clock reading of the next tick; `None` unless running.
    next_tick_at_ms: Option<u64>,
    /// Clock reading of the tick that reached zero.
    expired_at_ms: Option<u64>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_MS)
    }
}

impl CountdownTimer {
    /// Create an idle timer ticking every `interval_ms` (minimum 1 ms).
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            duration_ms: 0,
            remaining_ms: 0,
            status: CountdownStatus::Idle,
            next_tick_at_ms: None,
            expired_at_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> CountdownStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == CountdownStatus::Running
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Whole seconds left, rounded up so "0" only shows once expired.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms.div_ceil(1_000)
    }

    /// 0.0 .. 1.0 elapsed fraction.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return if self.status == CountdownStatus::Expired { 1.0 } else { 0.0 };
        }
        1.0 - (self.remaining_ms as f64 / self.duration_ms as f64)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.next_tick_at_ms
    }

    pub fn expired_at(&self) -> Option<u64> {
        self.expired_at_ms
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or restart) counting down from `duration_ms`.
    ///
    /// A zero-length countdown expires on the first `tick()` at or after
    /// `now_ms`.
    pub fn start(&mut self, duration_ms: u64, now_ms: u64) {
        self.duration_ms = duration_ms;
        self.remaining_ms = duration_ms;
        self.status = CountdownStatus::Running;
        self.expired_at_ms = None;
        self.next_tick_at_ms = Some(if duration_ms == 0 {
            now_ms
        } else {
            now_ms.saturating_add(self.interval_ms)
        });
    }

    /// Stop ticking, keeping `remaining_ms` as is.
    pub fn pause(&mut self) -> bool {
        if self.status != CountdownStatus::Running {
            return false;
        }
        self.status = CountdownStatus::Paused;
        self.next_tick_at_ms = None;
        true
    }

    /// Continue from the paused remaining time. The next tick comes a full
    /// interval after `now_ms`.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.status != CountdownStatus::Paused {
            return false;
        }
        self.status = CountdownStatus::Running;
        self.next_tick_at_ms = Some(now_ms.saturating_add(self.interval_ms));
        true
    }

    /// Make the timer inert. No further events are produced until the next
    /// `start()`.
    pub fn cancel(&mut self) -> bool {
        match self.status {
            CountdownStatus::Running | CountdownStatus::Paused | CountdownStatus::Idle => {
                self.status = CountdownStatus::Cancelled;
                self.next_tick_at_ms = None;
                true
            }
            CountdownStatus::Expired | CountdownStatus::Cancelled => false,
        }
    }

    /// Back to the full duration, stopped.
    pub fn reset(&mut self) {
        self.remaining_ms = self.duration_ms;
        self.status = CountdownStatus::Idle;
        self.next_tick_at_ms = None;
        self.expired_at_ms = None;
    }

    /// Deliver every tick due at `now_ms`, in order.
    ///
    /// The tick that reaches zero is followed by exactly one
    /// [`CountdownEvent::Expired`], after which the timer stops itself.
    pub fn tick(&mut self, now_ms: u64) -> Vec<CountdownEvent> {
        let mut events = Vec::new();
        while self.status == CountdownStatus::Running {
            let due = match self.next_tick_at_ms {
                Some(due) if due <= now_ms => due,
                _ => break,
            };
            if self.remaining_ms > 0 {
                self.remaining_ms = self.remaining_ms.saturating_sub(self.interval_ms);
                events.push(CountdownEvent::Tick {
                    remaining_ms: self.remaining_ms,
                });
            }
            if self.remaining_ms == 0 {
                self.status = CountdownStatus::Expired;
                self.next_tick_at_ms = None;
                self.expired_at_ms = Some(due);
                events.push(CountdownEvent::Expired);
                break;
            }
            self.next_tick_at_ms = Some(due.saturating_add(self.interval_ms));
        }
        events
    }

    /// Same as [`tick`](Self::tick), dispatching to an observer. Returns the
    /// number of callbacks made.
    pub fn drive<O: CountdownObserver + ?Sized>(&mut self, now_ms: u64, observer: &mut O) -> usize {
        let events = self.tick(now_ms);
        for event in &events {
            match *event {
                CountdownEvent::Tick { remaining_ms } => observer.on_tick(remaining_ms),
                CountdownEvent::Expired => observer.on_expire(),
            }
        }
        events.len()
    }
}
