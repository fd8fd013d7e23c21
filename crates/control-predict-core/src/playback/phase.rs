use serde::{Deserialize, Serialize};

/// Stage of one scenario's play-through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    /// Animation playing towards the pause point.
    Intro,
    /// Animation frozen; waiting for the child's prediction.
    PausedForPrediction,
    /// Choice recorded; animation playing to the end.
    Resolving,
    /// Animation finished; outcome badge on screen.
    Outcome,
    CorrectDone,
    /// Wrong prediction; the correct choice is on screen.
    IncorrectReveal,
    AdvancePending,
}

impl Phase {
    /// Phases that close a play-through.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::CorrectDone | Phase::AdvancePending)
    }

    /// The transition table. Anything not listed here is rejected.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            // abort
            (Idle, Idle) => false,
            (_, Idle) => true,
            (Idle | CorrectDone | AdvancePending, Intro) => true,
            (Intro, PausedForPrediction)
            | (PausedForPrediction, Resolving)
            | (Resolving, Outcome)
            | (Outcome, CorrectDone)
            | (Outcome, IncorrectReveal)
            | (IncorrectReveal, AdvancePending) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Intro => "intro",
            Phase::PausedForPrediction => "paused-for-prediction",
            Phase::Resolving => "resolving",
            Phase::Outcome => "outcome",
            Phase::CorrectDone => "correct-done",
            Phase::IncorrectReveal => "incorrect-reveal",
            Phase::AdvancePending => "advance-pending",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
