//! Process-wide wiring: one config store and one token session.
//!
//! Build an [`ApiContext`] once at startup and hand clones of it to whatever
//! needs the external API. Clones share the same store and token cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::api::AuthError;
use crate::auth::AuthSession;
use crate::config::Settings;
use crate::runtime_config::RuntimeConfigStore;

#[derive(Clone, Debug)]
pub struct ApiContext {
    pub config: Arc<RuntimeConfigStore>,
    pub auth: Arc<AuthSession>,
}

impl ApiContext {
    pub fn new(settings: &Settings) -> Result<Self, AuthError> {
        let config = Arc::new(RuntimeConfigStore::new(settings));
        let auth = AuthSession::new(config.clone(), settings.external_api_login_path.clone())?;
        debug!(login_path = %settings.external_api_login_path, "API context created");
        Ok(Self {
            config,
            auth: Arc::new(auth),
        })
    }

    /// Load settings from file and environment, falling back to defaults when
    /// the file cannot be read.
    pub fn load() -> Result<Self> {
        let settings = match Settings::load() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                let mut settings = Settings::default();
                settings.apply_env_overrides(|name| std::env::var(name).ok());
                settings
            }
        };
        Self::new(&settings).context("Failed to create HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::ConfigKey;

    #[test]
    fn test_clones_share_state() {
        let ctx = ApiContext::new(&Settings::default()).unwrap();
        let other = ctx.clone();
        other.config.set(ConfigKey::Username, "shared");
        assert_eq!(ctx.config.username(), "shared");
        assert!(Arc::ptr_eq(&ctx.auth, &other.auth));
        assert!(Arc::ptr_eq(ctx.auth.config(), &ctx.config));
    }
}
