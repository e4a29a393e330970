//! Runtime configuration and cached bearer-token session for an external API.
//!
//! - `config`: compiled-in defaults, config file and environment overlay
//! - `runtime_config`: in-memory overrides for base URL, username, password
//! - `auth`: token cache with expiry and credential-change invalidation
//! - `api`: login exchange and bearer-authorized HTTP client

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod runtime_config;

pub use api::{AuthError, AuthorizedClient, LoginClient, LoginGrant};
pub use auth::{AuthSession, CachedToken, CredentialTriple, TokenStatus};
pub use clock::{Clock, SystemClock};
pub use config::Settings;
pub use context::ApiContext;
pub use runtime_config::{ConfigError, ConfigKey, ConfigSnapshot, ConfigValue, RuntimeConfigStore};
