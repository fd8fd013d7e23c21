//! Millisecond clock for the synchronous drivers.

use std::time::{Duration, Instant};

/// Either follows the wall clock or jumps straight to each deadline.
pub enum Clock {
    Real(Instant),
    Virtual(u64),
}

impl Clock {
    pub fn new(realtime: bool) -> Self {
        if realtime {
            Clock::Real(Instant::now())
        } else {
            Clock::Virtual(0)
        }
    }

    pub fn now_ms(&self) -> u64 {
        match self {
            Clock::Real(origin) => origin.elapsed().as_millis() as u64,
            Clock::Virtual(now) => *now,
        }
    }

    /// Block (or jump) until `deadline_ms`.
    pub fn wait_until(&mut self, deadline_ms: u64) {
        match self {
            Clock::Real(origin) => {
                let elapsed = origin.elapsed();
                let target = Duration::from_millis(deadline_ms);
                if target > elapsed {
                    std::thread::sleep(target - elapsed);
                }
            }
            Clock::Virtual(now) => *now = (*now).max(deadline_ms),
        }
    }
}
