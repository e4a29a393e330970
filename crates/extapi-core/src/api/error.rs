use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login rejected with status {status}: {body}")]
    LoginRejected { status: u16, body: String },

    #[error("Malformed login response: {0}")]
    MalformedResponse(String),

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] reqwest::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        AuthError::LoginRejected {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }

    /// HTTP status of a rejected login, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::LoginRejected { status, .. } => Some(*status),
            AuthError::TransportFailure(e) => e.status().map(|s| s.as_u16()),
            AuthError::MalformedResponse(_) => None,
        }
    }
}
