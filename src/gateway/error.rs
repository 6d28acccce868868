//! Error handling for outbound API requests.
//!
//! The backend reports failures as `{"detail": ...}`. The detail is either a
//! human-readable string or, for request validation failures, a list of
//! `{"loc": [...], "msg": "...", "type": "..."}` items.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Credential cannot be sent as an authorization header")]
    InvalidCredential,

    #[error("Failed to connect to server: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Server returned error {status}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Failed to parse server response: {0}")]
    Decode(#[source] reqwest::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl GatewayError {
    /// Build a status error from a non-success response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        GatewayError::Status {
            status,
            detail: extract_detail(body),
        }
    }

    /// The backend's own explanation of the failure, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

/// Pull a user-displayable message out of an error response body.
pub fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
