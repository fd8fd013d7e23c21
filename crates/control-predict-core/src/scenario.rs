//! Scenario records: one predict-then-observe animated unit.
//!
//! A scenario plays for `duration_ms`, pausing at `pause_point` percent so the
//! child can predict what happens next. Records are immutable once built.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Icon used for animation kinds without a dedicated scene.
pub const GENERIC_ICON: &str = "🎬";

/// Animation tag attached to a scenario.
///
/// The set is open-ended: unknown tags are kept verbatim in `Other` and
/// rendered with the generic scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnimationKind {
    Ball,
    Light,
    Door,
    Swing,
    Slide,
    Faucet,
    Bell,
    Eraser,
    Pencil,
    Stethoscope,
    Thermometer,
    Bandage,
    Cart,
    Scanner,
    Bag,
    Candle,
    Balloon,
    Present,
    Other(String),
}

impl AnimationKind {
    pub fn as_str(&self) -> &str {
        match self {
            AnimationKind::Ball => "ball",
            AnimationKind::Light => "light",
            AnimationKind::Door => "door",
            AnimationKind::Swing => "swing",
            AnimationKind::Slide => "slide",
            AnimationKind::Faucet => "faucet",
            AnimationKind::Bell => "bell",
            AnimationKind::Eraser => "eraser",
            AnimationKind::Pencil => "pencil",
            AnimationKind::Stethoscope => "stethoscope",
            AnimationKind::Thermometer => "thermometer",
            AnimationKind::Bandage => "bandage",
            AnimationKind::Cart => "cart",
            AnimationKind::Scanner => "scanner",
            AnimationKind::Bag => "bag",
            AnimationKind::Candle => "candle",
            AnimationKind::Balloon => "balloon",
            AnimationKind::Present => "present",
            AnimationKind::Other(tag) => tag,
        }
    }

    /// True when the tag has no dedicated scene.
    pub fn is_generic(&self) -> bool {
        matches!(self, AnimationKind::Other(_))
    }

    /// Preview icon shown on the scenario card.
    pub fn icon(&self) -> &'static str {
        match self {
            AnimationKind::Ball => "⚽",
            AnimationKind::Light => "💡",
            AnimationKind::Door => "🚪",
            AnimationKind::Swing => "🎪",
            AnimationKind::Slide => "🛝",
            AnimationKind::Faucet => "💧",
            AnimationKind::Bell => "🔔",
            AnimationKind::Eraser => "📝",
            AnimationKind::Pencil => "✏️",
            AnimationKind::Stethoscope => "🩺",
            AnimationKind::Thermometer => "🌡️",
            AnimationKind::Bandage => "🩹",
            AnimationKind::Cart => "🛒",
            AnimationKind::Scanner => "📱",
            AnimationKind::Bag => "👜",
            AnimationKind::Candle => "🕯️",
            AnimationKind::Balloon => "🎈",
            AnimationKind::Present => "🎁",
            AnimationKind::Other(_) => GENERIC_ICON,
        }
    }
}

impl From<String> for AnimationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "ball" => AnimationKind::Ball,
            "light" => AnimationKind::Light,
            "door" => AnimationKind::Door,
            "swing" => AnimationKind::Swing,
            "slide" => AnimationKind::Slide,
            "faucet" => AnimationKind::Faucet,
            "bell" => AnimationKind::Bell,
            "eraser" => AnimationKind::Eraser,
            "pencil" => AnimationKind::Pencil,
            "stethoscope" => AnimationKind::Stethoscope,
            "thermometer" => AnimationKind::Thermometer,
            "bandage" => AnimationKind::Bandage,
            "cart" => AnimationKind::Cart,
            "scanner" => AnimationKind::Scanner,
            "bag" => AnimationKind::Bag,
            "candle" => AnimationKind::Candle,
            "balloon" => AnimationKind::Balloon,
            "present" => AnimationKind::Present,
            _ => AnimationKind::Other(tag),
        }
    }
}

impl From<AnimationKind> for String {
    fn from(kind: AnimationKind) -> Self {
        match kind {
            AnimationKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer the child can pick at the pause point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
    pub icon: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>, icon: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    /// Location the scenario belongs to (home, park, ...).
    #[serde(default)]
    pub location_id: String,
    pub animation_kind: AnimationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Percentage of `duration_ms` elapsed before playback pauses.
    pub pause_point: u8,
    pub duration_ms: u64,
    /// Display order.
    pub choices: Vec<Choice>,
}

impl Scenario {
    /// Check the structural invariants a controller relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant. The number of correct choices is
    /// not checked here; see [`Scenario::correct_choice`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.choices.is_empty() {
            return Err(ValidationError::NoChoices {
                scenario_id: self.id.clone(),
            });
        }
        if self.duration_ms == 0 {
            return Err(ValidationError::NonPositiveDuration {
                scenario_id: self.id.clone(),
            });
        }
        if self.pause_point > 100 {
            return Err(ValidationError::PausePointOutOfRange {
                scenario_id: self.id.clone(),
                pause_point: self.pause_point,
            });
        }
        let mut seen = HashSet::new();
        for choice in &self.choices {
            if !seen.insert(choice.id.as_str()) {
                return Err(ValidationError::DuplicateChoiceId {
                    scenario_id: self.id.clone(),
                    choice_id: choice.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// First choice flagged correct, if any.
    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }

    pub fn correct_choice_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_correct).count()
    }

    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// Split a (possibly speed-scaled) duration at the pause point.
    ///
    /// Returns `(until_pause, after_pause)`. The second segment is the
    /// remainder of the first, so the two always add up to `duration_ms`.
    pub fn segments(&self, duration_ms: u64) -> (u64, u64) {
        let pause_point = u64::from(self.pause_point.min(100));
        let until_pause = duration_ms.saturating_mul(pause_point) / 100;
        (until_pause, duration_ms - until_pause)
    }
}
