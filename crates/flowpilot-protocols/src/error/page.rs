//! Host page access errors.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading or mutating a host page.
///
/// Every variant is recoverable: extraction strategies and mutation
/// pathways translate them into "not found" and move on.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
