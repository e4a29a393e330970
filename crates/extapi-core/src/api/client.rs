//! Login exchange against the external API.
//!
//! Trades a [`CredentialTriple`] for a bearer token and its lifetime. Failures
//! are reported, never retried; retry policy belongs to the caller.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::CredentialTriple;

use super::AuthError;

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token lifetime assumed when the login response omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Serialize)]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Result of a successful login exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub access_token: String,
    pub expires_in: u64,
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct LoginClient {
    client: Client,
}

impl LoginClient {
    pub fn new() -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Use an existing client, e.g. one with a custom timeout or proxy.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// POST `{base_url}{login_path}` with the username and password as JSON.
    pub async fn login(
        &self,
        credentials: &CredentialTriple,
        login_path: &str,
    ) -> Result<LoginGrant, AuthError> {
        let url = credentials.login_url(login_path);
        debug!(url = %url, username = %credentials.username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&LoginRequest {
                user_name: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::from_status(status, &body));
        }

        Self::parse_grant(&body)
    }

    fn parse_grant(body: &str) -> Result<LoginGrant, AuthError> {
        let parsed: LoginResponse = serde_json::from_str(body)
            .map_err(|e| AuthError::MalformedResponse(format!("invalid login response body: {e}")))?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("No access_token in response".to_string()))?;

        if header::HeaderValue::from_str(&format!("Bearer {access_token}")).is_err() {
            return Err(AuthError::MalformedResponse(
                "access_token is not a valid header value".to_string(),
            ));
        }

        Ok(LoginGrant {
            access_token,
            expires_in: parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        })
    }
}
