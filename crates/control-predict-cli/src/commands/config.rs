use clap::Subcommand;
use control_predict_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, or a whole section as JSON
    Get {
        /// Dot-path key (e.g. "playback.reveal_ms", "breathing")
        key: String,
    },
    /// Change a value and save it ("none" clears optional values)
    Set {
        /// Dot-path key
        key: String,
        /// New value; arrays and sections take JSON
        value: String,
    },
    /// Print the whole configuration as JSON
    List,
    /// Print the config file location
    Path,
    /// Restore defaults for one key or section, or for everything
    Reset {
        /// Dot-path key; omit to reset the whole file
        key: Option<String>,
    },
}

fn lookup(config: &Config, key: &str) -> Result<String, ConfigError> {
    config
        .get(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Apply `change` to the saved config and print the key's new value.
fn update(
    key: &str,
    change: impl FnOnce(&mut Config) -> Result<(), ConfigError>,
) -> Result<(), ConfigError> {
    let mut config = Config::load()?;
    change(&mut config)?;
    config.save()?;
    println!("{key} = {}", lookup(&config, key)?);
    Ok(())
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => println!("{}", lookup(&Config::load()?, &key)?),
        ConfigAction::Set { key, value } => update(&key, |config| config.set(&key, &value))?,
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset { key: Some(key) } => update(&key, |config| config.reset_key(&key))?,
        ConfigAction::Reset { key: None } => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
