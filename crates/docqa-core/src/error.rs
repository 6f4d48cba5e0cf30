//! Error types for backend calls and user input checks

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-success status
    #[error("backend returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Backend { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Detail message supplied by the backend, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Backend { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pull the `detail` field out of an error body.
///
/// A string detail is used as is. A list (request validation errors) yields
/// the first item's `msg`. Anything else is kept as its JSON text.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;

    match detail {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(|msg| msg.as_str())
            .map(str::to_string)
            .or_else(|| Some(detail.to_string())),
        other => Some(other.to_string()),
    }
}
