//! Classified fetch errors

use thiserror::Error;

use super::transport::TransportError;

/// HTTP status the upstream uses for rate limiting
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Errors a fetch can surface when no cached copy exists to fall back on
///
/// The messages are meant to be shown to a user next to a retry action.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream answered 429
    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    /// Upstream answered with any other non-success status
    #[error("API error: {status} {message}")]
    Upstream { status: u16, message: String },

    /// The request could not complete
    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    /// A success response did not match the expected schema
    #[error("Unexpected response format: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classifies a non-success status
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == TOO_MANY_REQUESTS {
            return ApiError::RateLimited;
        }
        ApiError::Upstream {
            status,
            message: status_message(status, body),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }
}

/// Short reason for a status: the body's `error` field if it has one,
/// else the canonical reason phrase
fn status_message(status: u16, body: &str) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("error").and_then(|e| e.as_str()).map(str::to_string));

    from_body.unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string()
    })
}
