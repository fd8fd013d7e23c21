//! Core error types for control-predict-core.
//!
//! Playback and sequencing never surface errors to the child using the app:
//! invalid input is ignored or rejected before any state changes. The errors
//! here exist for the boundaries (scenario validation, configuration and
//! catalog files).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for control-predict-core.
///
/// Returned where more than one of the narrower errors can occur, such as
/// opening the catalog named by the configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scenario catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Structural problems with a scenario record.
///
/// A missing or duplicated correct choice is deliberately absent: that is an
/// authoring defect the controller tolerates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Scenario id must not be empty")]
    EmptyId,

    #[error("Scenario '{scenario_id}' has no choices")]
    NoChoices { scenario_id: String },

    #[error("Scenario '{scenario_id}' must have a positive duration")]
    NonPositiveDuration { scenario_id: String },

    #[error("Scenario '{scenario_id}' pause point {pause_point} is outside 0..=100")]
    PausePointOutOfRange { scenario_id: String, pause_point: u8 },

    #[error("Scenario '{scenario_id}' has duplicate choice id '{choice_id}'")]
    DuplicateChoiceId {
        scenario_id: String,
        choice_id: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Optional key needed by the caller is unset
    #[error("Configuration key '{0}' is not set")]
    MissingValue(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be prepared
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Scenario catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Catalog contains an invalid scenario: {0}")]
    InvalidScenario(#[from] ValidationError),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
