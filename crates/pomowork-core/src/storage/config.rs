//! TOML-based application configuration.
//!
//! Stores preferences that are not part of the timer state:
//! - Advice coach endpoint, model and debounce
//! - Sound cues
//! - Database file name
//!
//! Configuration is stored at `<data_dir>/config.toml`. Timer durations live
//! in the kv store instead (see [`super::StateKey::Settings`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Advice coach configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key. The key itself is never
    /// written to the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_task_chars")]
    pub min_task_chars: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Sound cue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell for cues.
    #[serde(default = "default_true")]
    pub terminal_bell: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file name, relative to the data directory.
    #[serde(default = "default_database")]
    pub database: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub advice: AdviceConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_debounce_ms() -> u64 {
    1500
}
fn default_min_task_chars() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_database() -> String {
    crate::storage::database::DEFAULT_DB_FILE.into()
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            debounce_ms: default_debounce_ms(),
            min_task_chars: default_min_task_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            terminal_bell: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
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
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Absolute path of the configured database file.
    pub fn database_path(&self) -> Result<PathBuf, crate::error::StorageError> {
        Ok(data_dir()?.join(&self.storage.database))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unreadable, using defaults");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[advice]\ndebounce_ms = 800\n").unwrap();
        assert_eq!(parsed.advice.debounce_ms, 800);
        assert_eq!(parsed.advice.min_task_chars, 5);
        assert!(parsed.sound.enabled);
        assert_eq!(parsed.storage.database, "pomowork.db");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("advice.debounce_ms").as_deref(), Some("1500"));
        assert_eq!(cfg.get("sound.terminal_bell").as_deref(), Some("true"));
        assert_eq!(cfg.get("advice.api_key_env").as_deref(), Some("GEMINI_API_KEY"));
        assert!(cfg.get("advice.missing_key").is_none());
        assert!(cfg.get("advice").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("sound.enabled", "false").unwrap();
        cfg.set("advice.min_task_chars", "8").unwrap();
        cfg.set("advice.model", "gemini-pro").unwrap();
        assert!(!cfg.sound.enabled);
        assert_eq!(cfg.advice.min_task_chars, 8);
        assert_eq!(cfg.advice.model, "gemini-pro");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("advice.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("sound", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("sound.enabled", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("advice.debounce_ms", "-3"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("advice.enabled", "false").unwrap();
        changed.save_to(&path).unwrap();
        assert!(!Config::load_from(&path).unwrap().advice.enabled);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "advice = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
