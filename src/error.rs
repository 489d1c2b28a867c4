use reqwest::StatusCode;
use thiserror::Error;

/// Errors that cross the chat pipeline boundary.
///
/// Malformed frames never show up here: the payload normalizer absorbs them.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Non-2xx status before any streamed byte.
    #[error("{detail}")]
    RequestRejected { status: StatusCode, detail: String },

    /// Connection failure or a read error in the middle of the body.
    #[error("{0}")]
    TransportInterrupted(String),

    /// The request was cancelled by the caller.
    #[error("request was cancelled")]
    Aborted,

    /// The non-streaming endpoint answered with a body we could not use.
    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

impl ChatError {
    /// Builds a rejection from the response status and its raw body text.
    ///
    /// FastAPI-style `{"detail": "..."}` bodies are unwrapped; an empty body
    /// falls back to the status line.
    pub fn rejected(status: StatusCode, body: &str) -> Self {
        let trimmed = body.trim();
        let detail = if trimmed.is_empty() {
            format!("HTTP {status}")
        } else {
            serde_json::from_str::<serde_json::Value>(trimmed)
                .ok()
                .and_then(|value| {
                    value
                        .get("detail")
                        .and_then(|detail| detail.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| trimmed.to_string())
        };
        Self::RequestRejected { status, detail }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportInterrupted(_) | Self::Aborted)
    }
}
