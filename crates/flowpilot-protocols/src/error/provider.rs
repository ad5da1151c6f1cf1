//! Chat provider errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing credential, endpoint or model. Fatal to the single request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty response from provider {0}")]
    EmptyResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}
