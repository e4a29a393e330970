use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::api::{AuthError, AuthorizedClient, LoginClient};
use crate::clock::{Clock, SystemClock};
use crate::runtime_config::RuntimeConfigStore;

use super::CredentialTriple;

/// Buffer before expiry at which a cached token stops being handed out.
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

#[derive(Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub issued_for: CredentialTriple,
}

impl CachedToken {
    /// Point after which the token is no longer handed out.
    pub fn refresh_at(&self) -> DateTime<Utc> {
        self.expires_at - Duration::seconds(TOKEN_REFRESH_BUFFER_SECS)
    }

    /// Non-empty, issued for exactly `current`, and strictly before the
    /// refresh point.
    pub fn is_valid_for(&self, current: &CredentialTriple, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && &self.issued_for == current && now < self.refresh_at()
    }

    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("issued_for", &self.issued_for)
            .finish()
    }
}

/// Display-oriented view of the cached token. Computing it does no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    NotAuthenticated,
    Valid { seconds_remaining: i64 },
    /// Inside the refresh buffer; the next request logs in again.
    Expiring { seconds_remaining: i64 },
    Expired,
    /// Issued for credentials that are no longer configured.
    Stale,
}

impl TokenStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, TokenStatus::Valid { .. })
    }

    pub fn display_message(&self) -> String {
        match self {
            TokenStatus::NotAuthenticated => "Not authenticated".to_string(),
            TokenStatus::Valid { seconds_remaining } => {
                format!("Valid for {}m {}s", seconds_remaining / 60, seconds_remaining % 60)
            }
            TokenStatus::Expiring { seconds_remaining } => {
                format!("Expiring in {seconds_remaining}s (will refresh on next use)")
            }
            TokenStatus::Expired => "Expired".to_string(),
            TokenStatus::Stale => "Credentials changed since login".to_string(),
        }
    }
}

/// Lazily refreshed bearer-token session.
///
/// One instance is meant to be shared (behind an `Arc`) by every caller in the
/// process. The cache is guarded by an async mutex that stays locked across
/// the whole check-login-store sequence, so concurrent callers that find the
/// cache empty wait for a single login and then reuse its token.
pub struct AuthSession {
    config: Arc<RuntimeConfigStore>,
    login_path: String,
    login_client: LoginClient,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl AuthSession {
    pub fn new(config: Arc<RuntimeConfigStore>, login_path: impl Into<String>) -> Result<Self, AuthError> {
        Ok(Self {
            config,
            login_path: login_path.into(),
            login_client: LoginClient::new()?,
            clock: Arc::new(SystemClock),
            cached: Mutex::new(None),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_login_client(mut self, login_client: LoginClient) -> Self {
        self.login_client = login_client;
        self
    }

    pub fn config(&self) -> &Arc<RuntimeConfigStore> {
        &self.config
    }

    /// Return a valid token, logging in first when the cache is empty,
    /// expiring, or was issued for different credentials.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        Ok(self.acquire().await?.token)
    }

    /// Client bound to `Authorization: Bearer <token>` for the base URL the
    /// token was issued for.
    pub async fn get_authorized_client(&self) -> Result<AuthorizedClient, AuthError> {
        let cached = self.acquire().await?;
        AuthorizedClient::new(cached.issued_for.base_url, cached.token)
    }

    /// Drop the cached token so the next request logs in again.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            info!("Cached access token invalidated");
        }
    }

    pub async fn status(&self) -> TokenStatus {
        let cached = self.cached.lock().await;
        let Some(token) = cached.as_ref() else {
            return TokenStatus::NotAuthenticated;
        };

        let now = self.clock.now();
        if token.issued_for != self.config.credentials() {
            TokenStatus::Stale
        } else if now >= token.expires_at {
            TokenStatus::Expired
        } else if now >= token.refresh_at() {
            TokenStatus::Expiring {
                seconds_remaining: token.seconds_until_expiry(now),
            }
        } else {
            TokenStatus::Valid {
                seconds_remaining: token.seconds_until_expiry(now),
            }
        }
    }

    async fn acquire(&self) -> Result<CachedToken, AuthError> {
        let mut cached = self.cached.lock().await;
        let current = self.config.credentials();

        if cached.as_ref().is_some_and(|t| t.issued_for != current) {
            info!(
                base_url = %current.base_url,
                username = %current.username,
                "External API configuration changed, discarding cached token"
            );
            *cached = None;
        }

        let now = self.clock.now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_for(&current, now)) {
            debug!(seconds_remaining = token.seconds_until_expiry(now), "Using cached access token");
            return Ok(token.clone());
        }

        let grant = match self.login_client.login(&current, &self.login_path).await {
            Ok(grant) => grant,
            Err(e) => {
                error!(error = %e, "Failed to fetch access token");
                // A 200 without a usable token voids whatever was cached.
                if matches!(e, AuthError::MalformedResponse(_)) {
                    *cached = None;
                }
                return Err(e);
            }
        };

        let token = CachedToken {
            token: grant.access_token,
            expires_at: expiry_after(self.clock.now(), grant.expires_in),
            issued_for: current,
        };
        info!(
            username = %token.issued_for.username,
            expires_in = grant.expires_in,
            "Successfully obtained access token"
        );

        *cached = Some(token.clone());
        Ok(token)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

fn expiry_after(now: DateTime<Utc>, expires_in: u64) -> DateTime<Utc> {
    i64::try_from(expires_in)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
