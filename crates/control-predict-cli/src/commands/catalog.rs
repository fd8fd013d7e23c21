use std::path::PathBuf;

use clap::Subcommand;
use control_predict_core::{Scenario, ScenarioCatalog, StaticCatalog};
use serde::Serialize;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Check every scenario record in a catalog file
    Validate {
        /// Catalog TOML file
        path: PathBuf,
    },
    /// List a location's scenarios in play order
    List {
        /// Catalog TOML file
        path: PathBuf,
        /// Location id
        #[arg(long)]
        location: String,
    },
    /// List the locations a catalog covers
    Locations {
        /// Catalog TOML file
        path: PathBuf,
    },
}

/// One row of `catalog list`.
#[derive(Serialize)]
struct ScenarioSummary<'a> {
    id: &'a str,
    title: &'a str,
    animation_kind: &'a str,
    icon: &'a str,
    pause_point: u8,
    duration_ms: u64,
    choices: usize,
    correct_choice: Option<&'a str>,
}

impl<'a> From<&'a Scenario> for ScenarioSummary<'a> {
    fn from(s: &'a Scenario) -> Self {
        Self {
            id: &s.id,
            title: &s.title,
            animation_kind: s.animation_kind.as_str(),
            icon: s.animation_kind.icon(),
            pause_point: s.pause_point,
            duration_ms: s.duration_ms,
            choices: s.choices.len(),
            correct_choice: s.correct_choice().map(|c| c.id.as_str()),
        }
    }
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CatalogAction::Validate { path } => {
            let catalog = StaticCatalog::load(&path)?;
            catalog.validate()?;
            let total = catalog.scenarios.len() + catalog.custom_scenarios.len();
            println!(
                "ok: {total} scenarios across {} locations",
                catalog.locations().len()
            );
        }
        CatalogAction::List { path, location } => {
            let catalog = StaticCatalog::load(&path)?;
            let scenarios = catalog.list_scenarios(&location);
            let rows: Vec<ScenarioSummary> = scenarios.iter().map(ScenarioSummary::from).collect();
            let json = serde_json::to_string_pretty(&rows)?;
            println!("{json}");
        }
        CatalogAction::Locations { path } => {
            let catalog = StaticCatalog::load(&path)?;
            for location in catalog.locations() {
                println!("{location}");
            }
        }
    }
    Ok(())
}
