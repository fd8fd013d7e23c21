//! Playback of a single scenario.
//!
//! The controller drives one play-through through a fixed phase sequence:
//!
//! ```text
//! Idle -> Intro -> PausedForPrediction -> Resolving -> Outcome
//!                                                        |
//!                         +------------------------------+
//!                         v                              v
//!                    CorrectDone              IncorrectReveal -> AdvancePending
//! ```
//!
//! Intro and Resolving end on timers whose lengths are the scenario duration
//! split at its pause point; PausedForPrediction waits for the child's choice
//! and Outcome waits for an acknowledgment.

mod config;
mod controller;
mod phase;

pub use config::{AnimationSpeed, PlaybackConfig};
pub use controller::{PlaybackController, PlaybackState};
pub use phase::Phase;
