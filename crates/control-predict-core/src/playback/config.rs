use serde::{Deserialize, Serialize};

/// Global animation pacing chosen in the parent settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl AnimationSpeed {
    /// Duration multiplier in percent.
    pub fn percent(self) -> u64 {
        match self {
            AnimationSpeed::Slow => 150,
            AnimationSpeed::Normal => 100,
            AnimationSpeed::Fast => 75,
        }
    }
}

impl std::str::FromStr for AnimationSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow" => Ok(AnimationSpeed::Slow),
            "normal" => Ok(AnimationSpeed::Normal),
            "fast" => Ok(AnimationSpeed::Fast),
            other => Err(format!("unknown animation speed: {other}")),
        }
    }
}

/// Timing knobs for playback and sequencing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How long the correct answer stays up after a wrong prediction.
    pub reveal_ms: u64,
    /// Pause before the next scenario starts, letting the reveal settle.
    pub advance_delay_ms: u64,
    /// When set, the outcome acknowledges itself after this long.
    pub outcome_hold_ms: Option<u64>,
    pub animation_speed: AnimationSpeed,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            reveal_ms: 2_500,
            advance_delay_ms: 300,
            outcome_hold_ms: None,
            animation_speed: AnimationSpeed::Normal,
        }
    }
}

impl PlaybackConfig {
    /// Apply the animation speed to a scenario duration.
    pub fn scaled_duration(&self, duration_ms: u64) -> u64 {
        duration_ms.saturating_mul(self.animation_speed.percent()) / 100
    }
}
