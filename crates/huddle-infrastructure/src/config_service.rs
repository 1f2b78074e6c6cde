//! Loading and saving the app configuration file.

use std::path::{Path, PathBuf};

use tokio::fs;

use huddle_core::config::AppConfig;
use huddle_core::{HuddleError, Result};

use crate::storage;

/// Default location of `config.toml` (`~/.config/huddle` on Linux).
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("huddle").join("config.toml"))
        .ok_or_else(|| HuddleError::config("could not determine a user config directory"))
}

/// Loads the configuration, treating a missing file as all-defaults.
pub async fn load_config(path: &Path) -> Result<AppConfig> {
    match fs::read_to_string(path).await {
        Ok(text) => {
            let cfg = toml::from_str(&text)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Saves the configuration atomically, creating parent directories as needed.
pub async fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        storage::ensure_dir(parent).await?;
    }
    let body = toml::to_string_pretty(config)?;
    storage::write_atomic(path, body.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("config.toml")).await.unwrap();
        assert_eq!(cfg.max_sessions, 3);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = AppConfig {
            max_sessions: 5,
            ..AppConfig::default()
        };
        save_config(&path, &cfg).await.unwrap();
        let back = load_config(&path).await.unwrap();
        assert_eq!(back.max_sessions, 5);
    }
}
