//! Judge-model error type.

/// Errors raised by the judge-model client.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("judge transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("judge endpoint returned {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, truncated for logging
        body: String,
    },

    /// The response body could not be parsed into the expected shape
    #[error("malformed judge response: {0}")]
    Parse(String),

    /// No endpoint/key configured
    #[error("judge model not configured")]
    NotConfigured,
}

impl JudgeError {
    /// Whether retrying the same request may succeed. Rate limits and
    /// server errors are transient; everything else is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Parse(_) | Self::NotConfigured => false,
        }
    }
}
