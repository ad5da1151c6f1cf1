//! Messages crossing the router boundary.
//!
//! The boundary is message-passing only: a workflow always travels as its
//! JSON text, never as a live object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request received by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    CheckN8n,
    ExtractWorkflow,
    ApplyWorkflow {
        workflow: JsonPayload,
    },
    #[serde(rename_all = "camelCase")]
    ApplyChanges {
        changes: JsonPayload,
        #[serde(default)]
        original_workflow: Option<JsonPayload>,
    },
    GetNodeTypes,
    GetCredentials,
}

impl Request {
    /// Action name as it appears on the wire.
    pub fn action(&self) -> &'static str {
        match self {
            Self::CheckN8n => "checkN8n",
            Self::ExtractWorkflow => "extractWorkflow",
            Self::ApplyWorkflow { .. } => "applyWorkflow",
            Self::ApplyChanges { .. } => "applyChanges",
            Self::GetNodeTypes => "getNodeTypes",
            Self::GetCredentials => "getCredentials",
        }
    }
}

/// A JSON document given either as text or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonPayload {
    Text(String),
    Value(Value),
}

impl JsonPayload {
    /// Parse text payloads; inline values pass through.
    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Text(text) => serde_json::from_str(&text),
            Self::Value(value) => Ok(value),
        }
    }
}

impl From<Value> for JsonPayload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Response returned by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Detection {
        #[serde(rename = "isN8n")]
        is_n8n: bool,
    },
    Workflow {
        /// JSON text of the graph.
        workflow: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        cached: bool,
    },
    Applied(ApplyResult),
    NodeTypes {
        #[serde(rename = "nodeTypes")]
        node_types: Vec<String>,
    },
    Credentials {
        credentials: Vec<CredentialSummary>,
    },
    Error {
        error: String,
    },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

/// Outcome of a mutation dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApplyResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A credential known to the host, without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub credential_type: String,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
