//! Error types for the Render API client

use thiserror::Error;

/// Errors surfaced by the propagating Render operations
#[derive(Debug, Error)]
pub enum RenderError {
    /// Request never produced a response (DNS, connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API key contains bytes that cannot go into an HTTP header
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// Caller-supplied argument rejected before any request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not authenticated - check your Render API key")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded - please try again later")]
    RateLimited,

    /// 5xx response
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Body was not the JSON shape the operation expects
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl RenderError {
    /// Map a non-2xx status and its (already extracted) message to a variant
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => RenderError::Unauthorized,
            403 => RenderError::PermissionDenied(message),
            404 => RenderError::NotFound(message),
            429 => RenderError::RateLimited,
            500..=599 => RenderError::Server { status, message },
            _ => RenderError::Api { status, message },
        }
    }

    /// HTTP status behind this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RenderError::Unauthorized => Some(401),
            RenderError::PermissionDenied(_) => Some(403),
            RenderError::NotFound(_) => Some(404),
            RenderError::RateLimited => Some(429),
            RenderError::Server { status, .. } | RenderError::Api { status, .. } => Some(*status),
            RenderError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Parse(err.to_string())
    }
}

/// Result alias for Render API operations
pub type Result<T> = std::result::Result<T, RenderError>;
