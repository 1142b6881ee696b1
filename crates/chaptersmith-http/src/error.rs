//! Errors from the HTTP backend layer.

use chaptersmith_core::error::DomainError;
use serde::Deserialize;

/// Errors from talking to the story server.
#[derive(Debug, thiserror::Error)]
pub enum HttpBackendError {
    /// The configured base URL cannot be used.
    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP request itself failed (connection, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Extracts the human-readable message of an error response: the `detail`
/// field of a JSON body, else the raw body, else the status text.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(ErrorBody { detail }) = serde_json::from_str::<ErrorBody>(body) {
        match detail {
            serde_json::Value::String(text) if !text.trim().is_empty() => return text,
            serde_json::Value::String(_) | serde_json::Value::Null => {}
            other => return other.to_string(),
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_owned();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| format!("HTTP {status}"), str::to_owned)
}

impl From<HttpBackendError> for DomainError {
    fn from(err: HttpBackendError) -> Self {
        match err {
            HttpBackendError::Api { status, body } => DomainError::Backend {
                status,
                message: error_message(status, &body),
            },
            HttpBackendError::Request(err) => DomainError::Transport(err.to_string()),
            HttpBackendError::InvalidBaseUrl(url) => {
                DomainError::Transport(format!("invalid backend URL: {url}"))
            }
        }
    }
}
