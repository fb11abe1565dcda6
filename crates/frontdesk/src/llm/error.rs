//! LLM error types.

use thiserror::Error;

/// Errors that can occur when calling a generative provider.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// No provider credentials were configured
    #[error("no generative provider configured")]
    NotConfigured,

    /// The response carried no usable candidate (e.g. blocked by a safety filter)
    #[error("response has no content: {0}")]
    NoContent(String),
}
