//! Error normalization for the pipeline API transport.
//!
//! Transport failures are wrapped in [`ApiError`], which keeps the HTTP status
//! and retry hints, and are converted into [`DealboardError`] at the boundary.

use std::fmt;

use crate::error::DealboardError;

/// Failure reported by the pipeline API.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, if available
    pub status: Option<reqwest::StatusCode>,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn with_status(message: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self {
            status: Some(status),
            retry_after: None,
            message: message.into(),
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status
            .is_some_and(|s| s == reqwest::StatusCode::TOO_MANY_REQUESTS)
    }

    /// Convert into the crate error, mapping 429 to `RateLimited`.
    pub fn to_dealboard_error(&self) -> DealboardError {
        if self.is_rate_limited() {
            return DealboardError::RateLimited(self.retry_after.unwrap_or(60));
        }

        match self.status {
            Some(status) => DealboardError::Api(format!(
                "{} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                self.message
            )),
            None => DealboardError::Api(self.message.clone()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for DealboardError {
    fn from(error: ApiError) -> Self {
        error.to_dealboard_error()
    }
}
