//! `reqwest` client pre-bound to a bearer token.

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder};

use super::client::REQUEST_TIMEOUT_SECS;
use super::AuthError;

/// HTTP client carrying `Authorization: Bearer <token>` on every request.
///
/// Relative paths passed to the request helpers are resolved against the base
/// URL the token was issued for.
#[derive(Clone)]
pub struct AuthorizedClient {
    client: Client,
    base_url: String,
    token: String,
}

impl AuthorizedClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into();
        let mut headers = header::HeaderMap::new();
        let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            AuthError::MalformedResponse("access_token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match (self.base_url.ends_with('/'), path.starts_with('/')) {
            (true, true) => format!("{}{}", self.base_url, &path[1..]),
            (false, false) => format!("{}/{}", self.base_url, path),
            _ => format!("{}{}", self.base_url, path),
        }
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = AuthorizedClient::new("https://api.example.com", "t").unwrap();
        assert_eq!(client.url("/items"), "https://api.example.com/items");
        assert_eq!(client.url("items"), "https://api.example.com/items");
        assert_eq!(client.url("https://other.example.com/x"), "https://other.example.com/x");

        let client = AuthorizedClient::new("https://api.example.com/", "t").unwrap();
        assert_eq!(client.url("/items"), "https://api.example.com/items");
    }

    #[test]
    fn test_rejects_token_unusable_as_header() {
        assert!(matches!(
            AuthorizedClient::new("https://api.example.com", "bad\ntoken"),
            Err(AuthError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = AuthorizedClient::new("https://api.example.com", "secret-token").unwrap();
        assert!(!format!("{:?}", client).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(header_is("authorization", "Bearer tok-9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthorizedClient::new(server.uri(), "tok-9").unwrap();
        let body = client.get("/items").send().await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
    }
}
