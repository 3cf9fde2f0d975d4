//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend base URL, the last email used to log in and
//! the "remember me" preference.
//!
//! Configuration is stored at `~/.config/vailog/config.json`. The session
//! record and the log file live in the data directory (`~/.local/share/vailog`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "vailog";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend origin used when neither the config file nor the environment sets one
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Environment variable overriding the backend origin
pub const API_URL_ENV: &str = "VAILOG_API_URL";

/// HTTP request timeout in seconds.
/// The chat endpoint can take a while to answer, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_email: Option<String>,
    pub remember: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            last_email: None,
            remember: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session record and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Resolve the backend origin: environment first, then config, then the default.
    /// Trailing slashes are stripped so paths can be appended verbatim.
    pub fn api_url(&self) -> String {
        let env = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        Self::resolve_api_url(env, self.api_url.clone())
    }

    fn resolve_api_url(env: Option<String>, configured: Option<String>) -> String {
        let url = env
            .or(configured)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        url.trim().trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_url_precedence() {
        assert_eq!(Config::resolve_api_url(None, None), DEFAULT_API_URL);
        assert_eq!(
            Config::resolve_api_url(None, Some("https://api.vai.com.br/".into())),
            "https://api.vai.com.br"
        );
        assert_eq!(
            Config::resolve_api_url(
                Some("http://127.0.0.1:8080".into()),
                Some("https://api.vai.com.br".into())
            ),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"last_email": "ana@vai.com"}"#)
            .expect("partial config should parse");
        assert_eq!(config.last_email.as_deref(), Some("ana@vai.com"));
        assert!(config.remember);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(config.api_url.is_none());
    }
}
