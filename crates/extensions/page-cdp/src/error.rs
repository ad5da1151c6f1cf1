//! Errors raised while talking to the browser.

use flowpilot_protocols::PageError;
use thiserror::Error;

use crate::protocol::RemoteFailure;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("no browser answering at {endpoint} ({reason}); start it with --remote-debugging-port")]
    BrowserUnreachable { endpoint: String, reason: String },

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("websocket: {0}")]
    WebSocket(String),

    #[error("{method} failed: {message} (code {code})")]
    Remote {
        method: String,
        code: i64,
        message: String,
    },

    #[error("malformed message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("target discovery: {0}")]
    Discovery(#[from] reqwest::Error),

    #[error("no page target matching {0}")]
    NoTarget(String),

    /// An exception thrown by page script.
    #[error("{0}")]
    Script(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("connection to the browser closed")]
    Closed,

    #[error("unexpected reply: {0}")]
    Unexpected(String),
}

impl CdpError {
    pub(crate) fn remote(method: &str, failure: RemoteFailure) -> Self {
        CdpError::Remote {
            method: method.to_string(),
            code: failure.code,
            message: failure.message,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Script(message) => PageError::Script(message),
            CdpError::Serialization(e) => PageError::Parse(e),
            CdpError::NoTarget(what) => PageError::NotFound(what),
            other => PageError::Transport(other.to_string()),
        }
    }
}
