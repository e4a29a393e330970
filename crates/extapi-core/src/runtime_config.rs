//! In-memory runtime overrides for the external API connection.
//!
//! Each of the three keys holds either [`ConfigValue::Default`] or an explicit
//! override. Reads fall back to the [`Settings`] captured at construction.
//! Nothing here is persisted; a restart returns every key to its default.

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::auth::CredentialTriple;
use crate::config::Settings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),

    #[error("URL must start with http:// or https://: {0}")]
    InvalidUrl(String),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    BaseUrl,
    Username,
    Password,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [ConfigKey::BaseUrl, ConfigKey::Username, ConfigKey::Password];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "external_api_base_url",
            ConfigKey::Username => "external_api_username",
            ConfigKey::Password => "external_api_password",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// State of a single key. An empty override is still an override.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigValue {
    #[default]
    Default,
    Override(String),
}

impl ConfigValue {
    pub fn is_override(&self) -> bool {
        matches!(self, ConfigValue::Override(_))
    }
}

/// Non-sensitive view of the connection settings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub external_api_base_url: String,
    pub external_api_username: String,
}

#[derive(Debug, Default)]
struct Slots {
    base_url: ConfigValue,
    username: ConfigValue,
    password: ConfigValue,
}

impl Slots {
    fn slot(&self, key: ConfigKey) -> &ConfigValue {
        match key {
            ConfigKey::BaseUrl => &self.base_url,
            ConfigKey::Username => &self.username,
            ConfigKey::Password => &self.password,
        }
    }

    fn slot_mut(&mut self, key: ConfigKey) -> &mut ConfigValue {
        match key {
            ConfigKey::BaseUrl => &mut self.base_url,
            ConfigKey::Username => &mut self.username,
            ConfigKey::Password => &mut self.password,
        }
    }
}

pub struct RuntimeConfigStore {
    defaults: Settings,
    slots: RwLock<Slots>,
}

impl fmt::Debug for RuntimeConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfigStore")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl RuntimeConfigStore {
    pub fn new(defaults: &Settings) -> Self {
        Self {
            defaults: defaults.clone(),
            slots: RwLock::new(Slots::default()),
        }
    }

    /// Current value for `key`: the override if set, else the default.
    pub fn get(&self, key: ConfigKey) -> String {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        self.resolve(&slots, key)
    }

    pub fn value(&self, key: ConfigKey) -> ConfigValue {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.slot(key).clone()
    }

    /// Store an override. No validation is performed here.
    pub fn set(&self, key: ConfigKey, value: impl Into<String>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        *slots.slot_mut(key) = ConfigValue::Override(value.into());
    }

    pub fn reset(&self, key: ConfigKey) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        *slots.slot_mut(key) = ConfigValue::Default;
    }

    pub fn base_url(&self) -> String {
        self.get(ConfigKey::BaseUrl)
    }

    pub fn username(&self) -> String {
        self.get(ConfigKey::Username)
    }

    pub fn password(&self) -> String {
        self.get(ConfigKey::Password)
    }

    /// All three values read under one lock.
    pub fn credentials(&self) -> CredentialTriple {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        CredentialTriple {
            base_url: self.resolve(&slots, ConfigKey::BaseUrl),
            username: self.resolve(&slots, ConfigKey::Username),
            password: self.resolve(&slots, ConfigKey::Password),
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        ConfigSnapshot {
            external_api_base_url: self.resolve(&slots, ConfigKey::BaseUrl),
            external_api_username: self.resolve(&slots, ConfigKey::Username),
        }
    }

    /// Validate and store a new base URL. Returns the stored value.
    pub fn update_base_url(&self, raw: &str) -> Result<String, ConfigError> {
        let url = normalize_base_url(raw)?;
        self.set(ConfigKey::BaseUrl, url.clone());
        info!(base_url = %url, "External API base URL updated");
        Ok(url)
    }

    /// Validate and store new credentials. Returns the stored username.
    pub fn update_credentials(&self, username: &str, password: &str) -> Result<String, ConfigError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ConfigError::EmptyValue("username"));
        }
        if password.is_empty() {
            return Err(ConfigError::EmptyValue("password"));
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.username = ConfigValue::Override(username.to_string());
        slots.password = ConfigValue::Override(password.to_string());
        drop(slots);

        info!(username = %username, "External API credentials updated");
        Ok(username.to_string())
    }

    fn resolve(&self, slots: &Slots, key: ConfigKey) -> String {
        match slots.slot(key) {
            ConfigValue::Override(value) => value.clone(),
            ConfigValue::Default => match key {
                ConfigKey::BaseUrl => self.defaults.external_api_base_url.clone(),
                ConfigKey::Username => self.defaults.external_api_username.clone(),
                ConfigKey::Password => self.defaults.external_api_password.clone(),
            },
        }
    }
}

/// Trim, require an http(s) scheme and drop trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(ConfigError::EmptyValue("URL"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::InvalidUrl(url.to_string()));
    }
    Ok(url.trim_end_matches('/').to_string())
}
