//! Cached bearer-token session against the external API.
//!
//! This module provides:
//! - `CredentialTriple`: the base URL and login credentials in effect
//! - `AuthSession`: lazy token cache with expiry and credential-change
//!   invalidation
//!
//! Tokens are refreshed 60 seconds before they expire. Nothing is persisted.

pub mod credentials;
pub mod session;

pub use credentials::CredentialTriple;
pub use session::{AuthSession, CachedToken, TokenStatus};
