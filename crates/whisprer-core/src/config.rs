use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::APP_NAME;

/// User configuration, stored as TOML in the platform config directory.
///
/// Every field is optional in the file so a hand-edited partial config
/// still loads, and defaults are not written back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key used to authenticate transcription requests. Without it
    /// capture still works but every transcription fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Transcription endpoint override for self-hosted deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Global hotkey that toggles recording, e.g. "meta+shift+semicolon".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,

    /// Copy finished transcripts to the system clipboard.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub auto_copy: bool,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            hotkey: None,
            auto_copy: true,
        }
    }
}

impl Config {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

/// Loads and saves the [`Config`] file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: Self::default_config_path()?,
        })
    }

    #[cfg(test)]
    pub fn with_config_dir(dir: &Path) -> Self {
        Self {
            config_path: dir.join(format!("{APP_NAME}.toml")),
        }
    }

    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{APP_NAME}.toml")))
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config from {}", self.config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", self.config_path.display()))?;

        if config.api_key().is_none() {
            warn!(
                "No API key is set. Transcriptions will fail until api_key is added to {}",
                self.config_path.display()
            );
        }

        Ok(config)
    }

    /// Write the configuration, creating the parent directory when needed.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
        std::fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config to {}", self.config_path.display()))?;

        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.api_key().is_none());
        assert!(config.endpoint().is_none());
        assert!(config.hotkey.is_none());
        assert!(config.auto_copy);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(dir.path());
        let config = manager.load().unwrap();
        assert!(config.api_key().is_none());
        assert!(config.auto_copy);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(dir.path());

        let config = Config {
            api_key: Some("wspr_test".to_owned()),
            endpoint: Some("https://localhost:9000/v1/transcribe".to_owned()),
            hotkey: Some("alt+shift+KeyR".to_owned()),
            auto_copy: false,
        };
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.api_key(), Some("wspr_test"));
        assert_eq!(loaded.endpoint(), Some("https://localhost:9000/v1/transcribe"));
        assert_eq!(loaded.hotkey.as_deref(), Some("alt+shift+KeyR"));
        assert!(!loaded.auto_copy);
    }

    #[test]
    fn defaults_are_not_written_out() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(dir.path());
        manager.save(&Config::default()).unwrap();

        let content = std::fs::read_to_string(manager.config_path()).unwrap();
        assert!(!content.contains("auto_copy"));
        assert!(!content.contains("api_key"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_dir(dir.path());
        std::fs::write(manager.config_path(), "api_key = \"wspr_test\"\n").unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.api_key(), Some("wspr_test"));
        assert!(config.auto_copy);
    }
}
