//! Wire types for the subset of the DevTools protocol Flowpilot speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing command frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Any frame the browser sends: a reply carries `id`, an event `method`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incoming {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RemoteFailure>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub session_id: Option<String>,
}

/// An incoming frame sorted by what it answers.
#[derive(Debug)]
pub enum Frame {
    Reply {
        id: u64,
        outcome: Result<Value, RemoteFailure>,
    },
    Event {
        session_id: Option<String>,
        event: Incoming,
    },
    Unknown,
}

impl Incoming {
    pub fn classify(self) -> Frame {
        match (self.id, self.method.is_some()) {
            (Some(id), _) => Frame::Reply {
                id,
                outcome: match self.error {
                    Some(failure) => Err(failure),
                    None => Ok(self.result.unwrap_or(Value::Null)),
                },
            },
            (None, true) => Frame::Event {
                session_id: self.session_id.clone(),
                event: self,
            },
            (None, false) => Frame::Unknown,
        }
    }
}

/// Error member of a reply.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFailure {
    pub code: i64,
    pub message: String,
}

/// An entry of `/json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// `/json/version`; Chrome uses mixed-case keys here.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// `Runtime.RemoteObject`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub subtype: Option<String>,
    pub value: Option<Value>,
    pub description: Option<String>,
    pub object_id: Option<String>,
}

impl RemoteObject {
    /// Objects and functions carry an id; `null` is an object without one.
    pub fn handle(&self) -> Option<&str> {
        match self.subtype.as_deref() {
            Some("null") => None,
            _ => self.object_id.as_deref(),
        }
    }
}

/// `Runtime.ExceptionDetails`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionDetails {
    pub text: String,
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// The thrown error's description when present, else the summary text.
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or_else(|| self.text.clone())
    }
}

/// Parameters of a `Runtime.bindingCalled` event.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingCalled {
    pub name: String,
    pub payload: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
