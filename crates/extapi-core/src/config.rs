//! Process-wide defaults for the external API connection.
//!
//! Defaults are compiled in, then overlaid by `~/.config/extapi/config.json`
//! when present, then by `EXTERNAL_API_*` environment variables. Runtime
//! overrides live in [`crate::runtime_config::RuntimeConfigStore`] and sit
//! above all of these.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application name used for the config directory path
const APP_NAME: &str = "extapi";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";
pub const DEFAULT_LOGIN_PATH: &str = "/api/v1/auth/login";

const ENV_BASE_URL: &str = "EXTERNAL_API_BASE_URL";
const ENV_USERNAME: &str = "EXTERNAL_API_USERNAME";
const ENV_PASSWORD: &str = "EXTERNAL_API_PASSWORD";
const ENV_LOGIN_PATH: &str = "EXTERNAL_API_LOGIN_PATH";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub external_api_base_url: String,
    pub external_api_username: String,
    pub external_api_password: String,
    pub external_api_login_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            external_api_base_url: DEFAULT_BASE_URL.to_string(),
            external_api_username: DEFAULT_USERNAME.to_string(),
            external_api_password: DEFAULT_PASSWORD.to_string(),
            external_api_login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("external_api_base_url", &self.external_api_base_url)
            .field("external_api_username", &self.external_api_username)
            .field("external_api_password", &"<redacted>")
            .field("external_api_login_path", &self.external_api_login_path)
            .finish()
    }
}

impl Settings {
    /// Load defaults, then the config file (if any), then the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?, |name| std::env::var(name).ok())
    }

    /// Load from `path`, then overlay whatever `lookup` returns. A missing
    /// file means defaults; an unreadable or unparsable one is an error.
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };

        settings.apply_env_overrides(lookup);
        debug!(settings = ?settings, "Settings loaded");
        Ok(settings)
    }

    /// Overlay values found through `lookup`. Empty variables are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (ENV_BASE_URL, &mut self.external_api_base_url),
            (ENV_USERNAME, &mut self.external_api_username),
            (ENV_PASSWORD, &mut self.external_api_password),
            (ENV_LOGIN_PATH, &mut self.external_api_login_path),
        ];
        for (name, slot) in fields {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_replace_defaults() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://api.example.com"),
            (ENV_USERNAME, "svc"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.external_api_base_url, "https://api.example.com");
        assert_eq!(settings.external_api_username, "svc");
        assert_eq!(settings.external_api_password, DEFAULT_PASSWORD);
        assert_eq!(settings.external_api_login_path, DEFAULT_LOGIN_PATH);
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|name| (name == ENV_PASSWORD).then(String::new));
        assert_eq!(settings.external_api_password, DEFAULT_PASSWORD);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"external_api_username": "ops"}"#).unwrap();
        assert_eq!(settings.external_api_username, "ops");
        assert_eq!(settings.external_api_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join(CONFIG_FILE), |_| None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_from_unparsable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let err = Settings::load_from(&path, |_| None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_from_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"external_api_base_url": "https://file.example.com", "external_api_username": "file-user"}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path, |name| {
            (name == ENV_USERNAME).then(|| "env-user".to_string())
        })
        .unwrap();

        assert_eq!(settings.external_api_base_url, "https://file.example.com");
        assert_eq!(settings.external_api_username, "env-user");
        assert_eq!(settings.external_api_password, DEFAULT_PASSWORD);
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = Settings {
            external_api_password: "hunter2".to_string(),
            ..Settings::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
