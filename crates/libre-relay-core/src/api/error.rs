use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
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

    /// Error for a non-success status on an authorized call or notification.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Transport(format!("status {}: {}", status, Self::truncate_body(body)))
    }

    /// Error for a non-success status on the login endpoint.
    pub fn login_rejected(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Authentication(format!("status {}: {}", status, Self::truncate_body(body)))
    }

    /// Error for a request that never produced a response.
    pub fn network(context: &str, err: reqwest::Error) -> Self {
        ApiError::Transport(format!("{}: {}", context, err))
    }
}
