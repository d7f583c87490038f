//! Turning HTTP failures into crate errors.

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::BackofficeError;

/// A non-success answer from the backend.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    /// Human-readable message, from the body when the backend sent one
    pub message: String,
    /// Whether the request was scoped to a parent record
    pub parent_scoped: bool,
}

impl ApiError {
    /// Build from a status and the raw response body.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )
        });
        Self {
            status,
            message,
            parent_scoped: false,
        }
    }

    pub fn parent_scoped(mut self, scoped: bool) -> Self {
        self.parent_scoped = scoped;
        self
    }

    /// The parent record is gone or its identifier was rejected.
    pub fn is_navigation_failure(&self) -> bool {
        self.parent_scoped
            && matches!(self.status, StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for BackofficeError {
    fn from(error: ApiError) -> Self {
        if error.is_navigation_failure() {
            return BackofficeError::NavigationContext(error.message);
        }
        BackofficeError::Network {
            message: error.message,
            status: Some(error.status.as_u16()),
        }
    }
}

/// Transport-level failures. Timeouts and connection errors are network
/// errors; a body that is not valid JSON is a malformed response.
impl From<reqwest::Error> for BackofficeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return BackofficeError::MalformedResponse(err.to_string());
        }
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not connect to the server".to_string()
        } else {
            err.to_string()
        };
        BackofficeError::Network {
            message,
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Pull `message` (or `error`) out of a JSON error body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"].iter().find_map(|key| match value.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Object(inner)) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}
