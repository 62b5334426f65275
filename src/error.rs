//! Error types for chaser
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! No error here is fatal to the long-running server process; only the
//! request or connection that hit it is affected. Configuration errors are
//! the one exception and only occur during startup.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for chaser
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration resolution errors (startup only)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog API unreachable or returned an error
    #[error("Catalog upstream unavailable: {0}")]
    Upstream(String),

    /// Video search network or parse error (recovered inside the resolver)
    #[error("Video resolution failed: {0}")]
    Resolution(String),

    /// Capture subprocess launch or termination failure
    #[error("Capture subprocess error: {0}")]
    Subprocess(String),

    /// Capture frame decode error
    #[error("Malformed capture frame: {0}")]
    MalformedFrame(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using chaser Error
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by HTTP handlers
///
/// Rendered as a small HTML page since the only fallible endpoint serves
/// HTML; an upstream catalog failure is a failed page render, not a masked
/// success.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream catalog unavailable (502)
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Upstream(msg) => ApiError::Upstream(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title, message) = match self {
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "Catalog unavailable", msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error", msg)
            }
        };

        let body = Html(format!(
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
             <body style=\"background:#1a1a1a;color:#e0e0e0;font-family:sans-serif;padding:40px\">\
             <h1>{title}</h1><p>{message}</p><p><a href=\"/\" style=\"color:#4a9eff\">Try again</a></p>\
             </body></html>"
        ));

        (status, body).into_response()
    }
}

/// Result type for HTTP handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
