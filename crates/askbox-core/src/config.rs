use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::controller::{ControllerSettings, DEFAULT_LOADING_TEXT};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/ask";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENDPOINT_ENV: &str = "ASKBOX_ENDPOINT";
pub const TIMEOUT_ENV: &str = "ASKBOX_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub loading_text: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config directory, falling back to defaults when
    /// no file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Overlay `ASKBOX_*` environment variables onto the file values
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )?;
        Ok(self)
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, timeout: Option<String>) -> Result<()> {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = Some(endpoint);
        }
        if let Some(timeout) = timeout {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                anyhow!("{} must be a whole number of seconds, got {:?}", TIMEOUT_ENV, timeout)
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            loading_text: self
                .loading_text
                .clone()
                .unwrap_or_else(|| DEFAULT_LOADING_TEXT.to_string()),
        }
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("askbox").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.controller_settings().loading_text, DEFAULT_LOADING_TEXT);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            endpoint: Some("http://10.0.0.5:8000/ask".to_string()),
            timeout_secs: Some(15),
            loading_text: Some("Thinking...".to_string()),
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config {
            endpoint: Some("http://file/ask".to_string()),
            ..Config::default()
        };
        config
            .apply_overrides(Some("http://env/ask".to_string()), Some(" 5 ".to_string()))
            .unwrap();
        assert_eq!(config.endpoint(), "http://env/ask");
        assert_eq!(config.timeout_secs, Some(5));

        // Blank endpoint does not clobber the file value
        config.apply_overrides(Some("  ".to_string()), None).unwrap();
        assert_eq!(config.endpoint(), "http://env/ask");

        assert!(config.apply_overrides(None, Some("soon".to_string())).is_err());
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = Config {
            timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
