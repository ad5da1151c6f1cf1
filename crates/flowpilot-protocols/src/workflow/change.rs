//! Discrete change operations applied against a live editor.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a [`ChangeOperation`].
///
/// Unknown kinds are kept rather than rejected at parse time so that a
/// batch with one bad entry can still apply the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeKind {
    UpdateNode,
    AddNode,
    RemoveNode,
    UpdateConnection,
    AddConnection,
    RemoveConnection,
    Unsupported(String),
}

impl ChangeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UpdateNode => "update_node",
            Self::AddNode => "add_node",
            Self::RemoveNode => "remove_node",
            Self::UpdateConnection => "update_connection",
            Self::AddConnection => "add_connection",
            Self::RemoveConnection => "remove_connection",
            Self::Unsupported(other) => other,
        }
    }
}

impl From<String> for ChangeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "update_node" => Self::UpdateNode,
            "add_node" => Self::AddNode,
            "remove_node" => Self::RemoveNode,
            "update_connection" => Self::UpdateConnection,
            "add_connection" => Self::AddConnection,
            "remove_connection" => Self::RemoveConnection,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<ChangeKind> for String {
    fn from(kind: ChangeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit to apply to the host editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeOperation {
    #[serde(rename = "type")]
    pub kind: ChangeKind,

    /// Identity of the node to mutate (update/remove node).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<Value>,

    /// Identity of the connection to mutate; hosts accept ids or descriptor objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<Value>,

    /// New payload (update/add operations).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ChangeOperation {
    pub fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            node_id: None,
            connection_id: None,
            data: None,
        }
    }

    pub fn with_node_id(mut self, id: impl Into<String>) -> Self {
        self.node_id = Some(Value::String(id.into()));
        self
    }

    pub fn with_connection_id(mut self, id: Value) -> Self {
        self.connection_id = Some(id);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Read one entry of a change list without failing the list.
    ///
    /// A missing or non-string `type` becomes [`ChangeKind::Unsupported`],
    /// so only that entry fails when applied.
    pub fn from_entry(entry: Value) -> Self {
        let Value::Object(mut fields) = entry else {
            return Self::new(ChangeKind::Unsupported(entry.to_string()));
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => ChangeKind::from(kind),
            Some(other) => ChangeKind::Unsupported(other.to_string()),
            None => ChangeKind::Unsupported("undefined".to_string()),
        };
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_null());
        Self {
            kind,
            node_id: take("nodeId"),
            connection_id: take("connectionId"),
            data: take("data"),
        }
    }

    /// Read a change list entry by entry.
    pub fn list_from_value(value: Value) -> Result<Vec<Self>, serde_json::Error> {
        let entries: Vec<Value> = serde_json::from_value(value)?;
        Ok(entries.into_iter().map(Self::from_entry).collect())
    }

    /// Node id rendered as text; numeric ids are accepted.
    pub fn node_id_text(&self) -> Option<String> {
        match self.node_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
