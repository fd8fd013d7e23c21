mod breathing;
mod countdown;
mod oneshot;

pub use breathing::{BreathPhase, BreathingExercise, BreathingPattern};
pub use countdown::{CountdownObserver, CountdownStatus, CountdownTimer, DEFAULT_TICK_INTERVAL_MS};
pub use oneshot::{Deadline, OneShot, TimerKind, TimerToken};
