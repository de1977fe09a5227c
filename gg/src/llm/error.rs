//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a chat-completions provider
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API key not found: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("Unknown LLM provider '{0}' (supported: openai, anthropic)")]
    UnknownProvider(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether the HTTP layer should try the request again
    ///
    /// Rate limits are not retried here; they surface with the provider's
    /// retry-after so the caller sees them at once.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504 | 529),
            LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::RateLimited { .. }
            | LlmError::MissingApiKey(_)
            | LlmError::UnknownProvider(_)
            | LlmError::InvalidResponse(_)
            | LlmError::Json(_) => false,
        }
    }

    /// Classify a transport error, separating client timeouts from other failures
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Network(err)
        }
    }
}
