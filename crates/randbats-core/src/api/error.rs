use thiserror::Error;

/// Why a request to an upstream data host failed.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Upstream refused access: {0}")]
    AccessDenied(String),

    #[error("Not found upstream: {0}")]
    NotFound(String),

    #[error("Rate limited by upstream host")]
    RateLimited,

    #[error("Upstream server error: {0}")]
    ServerError(String),

    #[error("Request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Longest response body kept in an error message, in bytes
const MAX_BODY_BYTES: usize = 500;

impl ApiError {
    fn clip_body(body: &str) -> String {
        if body.len() <= MAX_BODY_BYTES {
            return body.to_string();
        }
        let end = (0..=MAX_BODY_BYTES)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}... ({} bytes)", &body[..end], body.len())
    }

    /// Classify a non-success response.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let clipped = Self::clip_body(body);
        match status.as_u16() {
            // GitHub answers 403 when the anonymous API quota runs out
            403 if body.to_ascii_lowercase().contains("rate limit") => ApiError::RateLimited,
            401 | 403 => ApiError::AccessDenied(clipped),
            404 => ApiError::NotFound(clipped),
            429 => ApiError::RateLimited,
            _ if status.is_server_error() => ApiError::ServerError(clipped),
            code => ApiError::InvalidResponse(format!("HTTP {}: {}", code, clipped)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
