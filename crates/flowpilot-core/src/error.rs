//! Core error types.

use std::time::Duration;

use thiserror::Error;

/// Failure of a call across the page boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// No response arrived within the bound.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The serving side went away before answering.
    #[error("page context closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = BridgeError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "no response within 5s");
    }
}
