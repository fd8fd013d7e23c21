//! Scenario catalog boundary.
//!
//! A location's scenario list is the built-in scenarios followed by the
//! parent-authored ones, each group in its original order.
//!
//! Catalog files are TOML:
//!
//! ```toml
//! [[scenarios]]
//! id = "light-switch"
//! location_id = "home"
//! animation_kind = "light"
//! pause_point = 50
//! duration_ms = 2000
//! choices = [
//!     { id = "light-off", label = "Goes dark", icon = "🌑", is_correct = true },
//!     { id = "light-on", label = "Stays bright", icon = "💡" },
//! ]
//!
//! [[custom_scenarios]]
//! # same shape
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ConfigError, Result};
use crate::scenario::Scenario;
use crate::storage::Config;

pub trait ScenarioCatalog {
    /// Ordered scenarios for a location. Read-only for the caller.
    fn list_scenarios(&self, location_id: &str) -> Vec<Scenario>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub custom_scenarios: Vec<Scenario>,
}

impl StaticCatalog {
    pub fn new(scenarios: Vec<Scenario>, custom_scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            custom_scenarios,
        }
    }

    /// Parse a catalog without validating its records.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseFailed`] for malformed TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the catalog at `path`, or at `catalog.path` from the config when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingValue`] when neither names a file, or
    /// the catalog error from [`load`](Self::load).
    pub fn open(path: Option<&Path>, config: &Config) -> Result<Self> {
        let path = path
            .or(config.catalog.path.as_deref())
            .ok_or_else(|| ConfigError::MissingValue("catalog.path".into()))?;
        Ok(Self::load(path)?)
    }

    /// Check every record, built-ins first.
    ///
    /// # Errors
    ///
    /// Returns the first invalid record as [`CatalogError::InvalidScenario`].
    pub fn validate(&self) -> Result<(), CatalogError> {
        for scenario in self.scenarios.iter().chain(&self.custom_scenarios) {
            scenario.validate()?;
        }
        Ok(())
    }

    /// Location ids in order of first appearance.
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = Vec::new();
        for scenario in self.scenarios.iter().chain(&self.custom_scenarios) {
            if !locations.contains(&scenario.location_id) {
                locations.push(scenario.location_id.clone());
            }
        }
        locations
    }
}

impl ScenarioCatalog for StaticCatalog {
    fn list_scenarios(&self, location_id: &str) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .chain(&self.custom_scenarios)
            .filter(|s| s.location_id == location_id)
            .cloned()
            .collect()
    }
}
