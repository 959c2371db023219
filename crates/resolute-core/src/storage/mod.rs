mod config;
pub mod database;

pub use config::{ChallengeConfig, Config, SweepConfig};
pub use database::ChallengeDb;

use std::path::PathBuf;

/// Returns `~/.config/resolute[-dev]/` based on RESOLUTE_ENV.
///
/// Set RESOLUTE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RESOLUTE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("resolute-dev")
    } else {
        base_dir.join("resolute")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
