//! # Control & Predict Core Library
//!
//! This library provides the engine behind the Control & Predict learning app:
//! a child watches a short cause-and-effect animation, it pauses, the child
//! predicts what happens next, and the animation resumes to show the outcome.
//! Everything runs headless; the CLI and any GUI are thin layers over it.
//!
//! ## Architecture
//!
//! - **Playback**: A clock-driven state machine for one play-through. The
//!   caller passes its clock reading (ms) to every command and calls `tick()`
//!   until `next_deadline()`.
//! - **Sequencer**: Walks a location's scenarios, records progress, and
//!   advances after wrong answers.
//! - **Timers**: Countdowns for the calming and routine screens, guided
//!   breathing, and the one-shot slots playback uses internally.
//! - **Storage**: TOML-based configuration.
//!
//! ## Key Components
//!
//! - [`PlaybackController`]: Single scenario play-through
//! - [`ScenarioSequencer`]: Ordered play across a location
//! - [`CountdownTimer`]: Tick-per-interval countdown
//! - [`Config`]: Application configuration management

pub mod catalog;
pub mod error;
pub mod events;
pub mod playback;
pub mod progress;
pub mod runtime;
pub mod scenario;
pub mod sequencer;
pub mod storage;
pub mod timer;

pub use catalog::{ScenarioCatalog, StaticCatalog};
pub use error::{CatalogError, ConfigError, CoreError, ValidationError};
pub use events::{BreathingEvent, CountdownEvent, PlaybackEvent, SequencerEvent};
pub use playback::{AnimationSpeed, Phase, PlaybackConfig, PlaybackController, PlaybackState};
pub use progress::{MemoryProgress, ProgressSnapshot, ProgressStore, SessionEntry};
pub use runtime::{spawn_countdown, CountdownHandle};
pub use scenario::{AnimationKind, Choice, Scenario};
pub use sequencer::{ScenarioSequencer, SequenceMode};
pub use storage::Config;
pub use timer::{
    BreathPhase, BreathingExercise, BreathingPattern, CountdownObserver, CountdownStatus,
    CountdownTimer, TimerKind, TimerToken,
};
