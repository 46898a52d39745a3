use clap::Subcommand;
use pomowork_core::Config;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "advice.debounce_ms", "sound.enabled")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Show the whole configuration
    Show,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            if json {
                print_json(&config)?;
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
