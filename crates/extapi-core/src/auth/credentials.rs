use std::fmt;

/// The (base URL, username, password) triple in effect at some moment.
///
/// A cached token remembers the triple that produced it; any difference
/// from the current triple voids the token.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTriple {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl CredentialTriple {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Full login URL for this base URL.
    pub fn login_url(&self, login_path: &str) -> String {
        format!("{}{}", self.base_url, login_path)
    }
}

impl fmt::Debug for CredentialTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTriple")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_field_change_breaks_equality() {
        let base = CredentialTriple::new("http://a", "u", "p");
        assert_eq!(base, CredentialTriple::new("http://a", "u", "p"));
        assert_ne!(base, CredentialTriple::new("http://b", "u", "p"));
        assert_ne!(base, CredentialTriple::new("http://a", "v", "p"));
        assert_ne!(base, CredentialTriple::new("http://a", "u", "q"));
    }

    #[test]
    fn test_login_url_concatenates_path() {
        let creds = CredentialTriple::new("https://api.example.com", "u", "p");
        assert_eq!(creds.login_url("/auth/login"), "https://api.example.com/auth/login");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = CredentialTriple::new("http://a", "u", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
