use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scenario::Choice;
use crate::timer::BreathPhase;

/// Every phase change of a play-through produces a PlaybackEvent.
/// The rendering layer switches views on them; the sequencer reacts to the
/// terminal ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaybackEvent {
    Started {
        scenario_id: String,
        /// Delay until the pause point, after speed scaling.
        pause_in_ms: u64,
        at: DateTime<Utc>,
    },
    /// Animation reached the pause point; choices should be shown.
    Paused {
        scenario_id: String,
        at: DateTime<Utc>,
    },
    ChoiceRecorded {
        scenario_id: String,
        selected: Choice,
        correct: Option<Choice>,
        /// Delay until the animation finishes.
        completes_in_ms: u64,
        at: DateTime<Utc>,
    },
    /// Animation finished after the decision.
    Completed {
        scenario_id: String,
        selected: Option<Choice>,
        correct: Option<Choice>,
        at: DateTime<Utc>,
    },
    ScenarioMastered {
        scenario_id: String,
        selected: Choice,
        at: DateTime<Utc>,
    },
    /// Wrong answer: show the correct one (absent on authoring defects).
    Revealed {
        scenario_id: String,
        selected: Option<Choice>,
        correct: Option<Choice>,
        at: DateTime<Utc>,
    },
    AdvanceReady {
        scenario_id: String,
        correct: Option<Choice>,
        at: DateTime<Utc>,
    },
}

impl PlaybackEvent {
    pub fn scenario_id(&self) -> &str {
        match self {
            PlaybackEvent::Started { scenario_id, .. }
            | PlaybackEvent::Paused { scenario_id, .. }
            | PlaybackEvent::ChoiceRecorded { scenario_id, .. }
            | PlaybackEvent::Completed { scenario_id, .. }
            | PlaybackEvent::ScenarioMastered { scenario_id, .. }
            | PlaybackEvent::Revealed { scenario_id, .. }
            | PlaybackEvent::AdvanceReady { scenario_id, .. } => scenario_id,
        }
    }

    /// Terminal events close a play-through and are handled by the sequencer.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::ScenarioMastered { .. } | PlaybackEvent::AdvanceReady { .. }
        )
    }
}

/// Events produced while walking a location's scenario list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SequencerEvent {
    ScenarioSelected {
        index: usize,
        scenario_id: String,
        at: DateTime<Utc>,
    },
    /// The selected record failed validation; the sequencer stayed on the
    /// selection screen.
    ScenarioRejected {
        index: usize,
        scenario_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    Playback {
        index: usize,
        event: PlaybackEvent,
    },
    ProgressRecorded {
        location_id: String,
        scenarios_completed: u64,
        at: DateTime<Utc>,
    },
    /// Next scenario will start after `delay_ms`.
    AdvanceScheduled {
        from_index: usize,
        to_index: usize,
        delay_ms: u64,
        at: DateTime<Utc>,
    },
    ReturnedToSelection {
        at: DateTime<Utc>,
    },
}

/// Countdown output. Kept free of timestamps: ticks are frequent and the
/// remaining time is the only thing consumers render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CountdownEvent {
    Tick { remaining_ms: u64 },
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BreathingEvent {
    PhaseStarted {
        phase: BreathPhase,
        cycle: u32,
        duration_ms: u64,
    },
    Tick {
        phase: BreathPhase,
        remaining_ms: u64,
    },
    CycleCompleted {
        count: u32,
    },
    Finished,
}
