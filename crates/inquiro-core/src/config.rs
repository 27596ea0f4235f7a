use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const ENV_API_BASE_URL: &str = "INQUIRO_API_URL";
pub const DEFAULT_NOTIFICATION_SECS: u64 = 6;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const APP_DIR: &str = "inquiro";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the platform config directory, falling back to defaults
    /// when no file has been written yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the backend base URL.
    ///
    /// Precedence: explicit override (command line), `INQUIRO_API_URL`,
    /// the config file, then the local default. Returns the normalized URL
    /// and a label naming where it came from.
    pub fn resolve_base_url(
        &self,
        cli_override: Option<&str>,
    ) -> Result<(String, &'static str), ConfigError> {
        if let Some(url) = cli_override.filter(|u| !u.trim().is_empty()) {
            return normalize_base_url(url).map(|u| (u, "flag"));
        }
        if let Some(url) = env_non_empty(ENV_API_BASE_URL) {
            return normalize_base_url(&url).map(|u| (u, ENV_API_BASE_URL));
        }
        if let Some(url) = self.api_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return normalize_base_url(url).map(|u| (u, "config"));
        }
        normalize_base_url(DEFAULT_API_BASE_URL).map(|u| (u, "default"))
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_secs(self.notification_secs.unwrap_or(DEFAULT_NOTIFICATION_SECS))
    }

    /// Log filter: `RUST_LOG` wins over the config file.
    pub fn log_filter(&self) -> String {
        env_non_empty("RUST_LOG")
            .or_else(|| self.log_level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR))
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn session_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("session.json"))
    }

    pub fn log_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("inquiro.log"))
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(trimmed.to_string()));
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl(trimmed.to_string()));
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_trailing_slash() {
        let url = normalize_base_url(" http://localhost:8000/ ").unwrap();
        assert_eq!(url, "http://localhost:8000");
    }

    #[test]
    fn test_normalize_requires_scheme_and_host() {
        assert!(matches!(
            normalize_base_url("localhost:8000"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("http:///docs"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert!(matches!(normalize_base_url("  "), Err(ConfigError::EmptyBaseUrl)));
    }

    #[test]
    fn test_flag_override_wins() {
        let config = Config {
            api_base_url: Some("http://config.example".to_string()),
            ..Config::default()
        };
        let (url, source) = config
            .resolve_base_url(Some("https://flag.example/"))
            .unwrap();
        assert_eq!(url, "https://flag.example");
        assert_eq!(source, "flag");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.notification_duration(), Duration::from_secs(6));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: Some("http://10.0.0.2:8000".to_string()),
            log_level: Some("debug".to_string()),
            notification_secs: Some(3),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.notification_duration(), Duration::from_secs(3));
    }
}
