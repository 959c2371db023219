//! TOML-based application configuration.
//!
//! Stores the local user's profile defaults:
//! - Owner id and IANA timezone used for new challenges
//! - Default sharing visibility
//! - Sweep cadence
//!
//! Configuration is stored at `~/.config/resolute/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::challenge::Visibility;
use crate::error::{ConfigError, CoreError};

/// Challenge profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "default_owner")]
    pub owner: String,
    /// IANA timezone name; validated when a challenge is created.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
}

/// Sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/resolute/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
}

fn default_owner() -> String {
    "local".to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_visibility() -> Visibility {
    Visibility::Private
}
fn default_interval_hours() -> u64 {
    4
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            timezone: default_timezone(),
            visibility: default_visibility(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            challenge: ChallengeConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.challenge.owner, "local");
        assert_eq!(cfg.challenge.timezone, "UTC");
        assert_eq!(cfg.challenge.visibility, Visibility::Private);
        assert_eq!(cfg.sweep.interval_hours, 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut cfg = Config::default();
        cfg.challenge.timezone = "America/New_York".to_string();
        cfg.sweep.interval_hours = 6;

        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.challenge.timezone, "America/New_York");
        assert_eq!(parsed.sweep.interval_hours, 6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str("[challenge]\ntimezone = \"Europe/Berlin\"\n").unwrap();
        assert_eq!(parsed.challenge.timezone, "Europe/Berlin");
        assert_eq!(parsed.challenge.owner, "local");
        assert_eq!(parsed.sweep.interval_hours, 4);
    }
}
