//! TOML-based application configuration.
//!
//! Stores the parent-facing settings:
//! - Playback pacing (reveal time, advance delay, animation speed)
//! - Countdown tick interval with the calming and routine presets
//! - Breathing exercise pattern
//! - Optional scenario catalog location
//!
//! Configuration is stored at `~/.config/control-predict/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::playback::PlaybackConfig;
use crate::timer::{BreathingPattern, DEFAULT_TICK_INTERVAL_MS};

/// Longest preset accepted, in seconds.
pub const MAX_PRESET_SECS: u64 = 24 * 60 * 60;

/// Countdown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Durations offered on the calming screen, in seconds.
    #[serde(default = "default_presets_secs")]
    pub presets_secs: Vec<u64>,
    /// Practice durations offered for routines, in seconds.
    #[serde(default = "default_routine_presets_secs")]
    pub routine_presets_secs: Vec<u64>,
}

/// Where scenarios come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/control-predict/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub breathing: BreathingPattern,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
fn default_presets_secs() -> Vec<u64> {
    vec![30, 60, 120]
}
fn default_routine_presets_secs() -> Vec<u64> {
    vec![60, 120, 180]
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            presets_secs: default_presets_secs(),
            routine_presets_secs: default_routine_presets_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = if matches!(value, "none" | "null") {
                    serde_json::Value::Null
                } else {
                    match existing {
                        serde_json::Value::Bool(_) => serde_json::Value::Bool(
                            value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                        ),
                        serde_json::Value::Number(_) => serde_json::Value::Number(
                            value
                                .parse::<u64>()
                                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                                .into(),
                        ),
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        }
                        // Unset optionals take whatever shape the value has.
                        serde_json::Value::Null => match value.parse::<u64>() {
                            Ok(n) => serde_json::Value::Number(n.into()),
                            Err(_) => serde_json::Value::String(value.into()),
                        },
                        serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the defaults cannot
    /// be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Render as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Reject values the timers cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countdown.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "countdown.tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        let presets = [
            ("countdown.presets_secs", &self.countdown.presets_secs),
            ("countdown.routine_presets_secs", &self.countdown.routine_presets_secs),
        ];
        for (key, secs) in presets {
            if secs.iter().any(|&s| s == 0 || s > MAX_PRESET_SECS) {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("presets must be between 1 and {MAX_PRESET_SECS} seconds"),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not persist.
    ///
    /// `none` clears an optional value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field; the config is left unchanged in that case.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Put one key (or a whole section) back to its default. Does not persist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] if the key does not exist.
    pub fn reset_key(&mut self, key: &str) -> Result<(), ConfigError> {
        let default = Self::default()
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        self.set(key, &default)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::AnimationSpeed;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = cfg.to_toml().unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.playback.reveal_ms, 2_500);
        assert_eq!(cfg.playback.advance_delay_ms, 300);
        assert_eq!(cfg.countdown.tick_interval_ms, 1_000);
        assert_eq!(cfg.countdown.presets_secs, vec![30, 60, 120]);
        assert_eq!(cfg.countdown.routine_presets_secs, vec![60, 120, 180]);
        assert_eq!(cfg.breathing.cycles, 3);
        assert!(cfg.catalog.path.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str("[countdown]\ntick_interval_ms = 500\n[breathing]\ncycles = 5").unwrap();
        assert_eq!(cfg.countdown.tick_interval_ms, 500);
        assert_eq!(cfg.countdown.presets_secs, vec![30, 60, 120]);
        assert_eq!(cfg.breathing.cycles, 5);
        assert_eq!(cfg.breathing.inhale_ms, 4_000);
        assert_eq!(cfg.playback, PlaybackConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("playback.reveal_ms").as_deref(), Some("2500"));
        assert_eq!(cfg.get("playback.animation_speed").as_deref(), Some("normal"));
        assert_eq!(cfg.get("playback.outcome_hold_ms").as_deref(), Some("null"));
        assert!(cfg.get("playback.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("playback.reveal_ms", "1500").unwrap();
        cfg.set("playback.animation_speed", "slow").unwrap();
        cfg.set("countdown.presets_secs", "[10, 20]").unwrap();
        assert_eq!(cfg.playback.reveal_ms, 1_500);
        assert_eq!(cfg.playback.animation_speed, AnimationSpeed::Slow);
        assert_eq!(cfg.countdown.presets_secs, vec![10, 20]);
    }

    #[test]
    fn set_fills_and_clears_optionals() {
        let mut cfg = Config::default();
        cfg.set("playback.outcome_hold_ms", "2500").unwrap();
        assert_eq!(cfg.playback.outcome_hold_ms, Some(2_500));
        cfg.set("playback.outcome_hold_ms", "none").unwrap();
        assert_eq!(cfg.playback.outcome_hold_ms, None);

        cfg.set("catalog.path", "/tmp/home.toml").unwrap();
        assert_eq!(cfg.catalog.path, Some(PathBuf::from("/tmp/home.toml")));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("playback.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values_without_change() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("playback.reveal_ms", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("playback.animation_speed", "warp"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("countdown.tick_interval_ms", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("playback.reveal_ms", "none"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("breathing.hold_ms", "3000").unwrap();
        cfg.set("playback.outcome_hold_ms", "2000").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.breathing.hold_ms, 3_000);
        assert_eq!(loaded.playback.outcome_hold_ms, Some(2_000));
    }

    #[test]
    fn load_from_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[playback\nreveal_ms = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn presets_are_capped_at_one_day() {
        let mut cfg = Config::default();
        cfg.set("countdown.presets_secs", "[86400]").unwrap();
        assert!(matches!(
            cfg.set("countdown.presets_secs", "[18446744073709552]"),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "countdown.presets_secs"
        ));
        assert!(matches!(
            cfg.set("countdown.routine_presets_secs", "[60, 86401]"),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "countdown.routine_presets_secs"
        ));
        assert_eq!(cfg.countdown.presets_secs, vec![86_400]);
        assert_eq!(cfg.countdown.routine_presets_secs, vec![60, 120, 180]);
    }

    #[test]
    fn load_from_rejects_oversized_preset_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[countdown]\nroutine_presets_secs = [100000]\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn reset_key_restores_only_that_key() {
        let mut cfg = Config::default();
        cfg.set("playback.reveal_ms", "1200").unwrap();
        cfg.set("playback.outcome_hold_ms", "900").unwrap();
        cfg.set("breathing.cycles", "5").unwrap();
        cfg.set("countdown.presets_secs", "[10]").unwrap();

        cfg.reset_key("playback.reveal_ms").unwrap();
        cfg.reset_key("playback.outcome_hold_ms").unwrap();
        cfg.reset_key("countdown").unwrap();
        assert_eq!(cfg.playback.reveal_ms, 2_500);
        assert_eq!(cfg.playback.outcome_hold_ms, None);
        assert_eq!(cfg.countdown, CountdownConfig::default());
        assert_eq!(cfg.breathing.cycles, 5);

        assert!(matches!(
            cfg.reset_key("playback.nope"),
            Err(ConfigError::UnknownKey(_))
        ));
    }
}
