//! Error handling module
//!
//! This module provides the centralized error taxonomy for the service.
//! Caller input problems, missing provider credentials and provider
//! failures are kept distinct so handlers can map each class to the right
//! HTTP status.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider authentication failed: HTTP {status}: {body}")]
    ProviderAuth { status: u16, body: String },

    #[error("Provider request failed: {message}")]
    ProviderRequest { status: Option<u16>, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("Webhook signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a provider request error from an HTTP status and response body.
    pub fn provider_http(status: u16, body: impl Into<String>) -> Self {
        AppError::ProviderRequest {
            status: Some(status),
            message: format!("HTTP {}: {}", status, body.into()),
        }
    }

    /// Build a provider request error for a transport-level failure. The
    /// provider may have completed the operation despite the failed
    /// round-trip, so callers must re-check rather than assume failure.
    pub fn provider_transport(message: impl Into<String>) -> Self {
        AppError::ProviderRequest {
            status: None,
            message: message.into(),
        }
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SignatureVerification(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            AppError::ProviderAuth { .. }
            | AppError::ProviderRequest { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

// Implement warp::reject::Reject for AppError
impl warp::reject::Reject for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ProviderRequest {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
