//! One unit of work for the dispatcher, with the host call shapes it needs.

use flowpilot_protocols::{ChangeKind, ChangeOperation};
use serde_json::{Value, json};

use super::pathway::Pathway;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mutation {
    Import(Value),
    UpdateNode { node_id: Value, data: Value },
    AddNode(Value),
    RemoveNode(Value),
    UpdateConnection { connection_id: Value, data: Value },
    AddConnection(Value),
    RemoveConnection(Value),
}

impl Mutation {
    /// Map a change operation; unknown kinds are rejected with their name.
    pub fn from_change(change: &ChangeOperation) -> Result<Self, String> {
        let node_id = || change.node_id.clone().unwrap_or(Value::Null);
        let connection_id = || change.connection_id.clone().unwrap_or(Value::Null);
        let data = || change.data.clone().unwrap_or(Value::Null);

        Ok(match &change.kind {
            ChangeKind::UpdateNode => Self::UpdateNode {
                node_id: node_id(),
                data: data(),
            },
            ChangeKind::AddNode => Self::AddNode(data()),
            ChangeKind::RemoveNode => Self::RemoveNode(node_id()),
            ChangeKind::UpdateConnection => Self::UpdateConnection {
                connection_id: connection_id(),
                data: data(),
            },
            ChangeKind::AddConnection => Self::AddConnection(data()),
            ChangeKind::RemoveConnection => Self::RemoveConnection(connection_id()),
            ChangeKind::Unsupported(kind) => return Err(format!("unsupported type: {}", kind)),
        })
    }

    /// Pathways to probe, highest priority first.
    pub fn pathways(&self) -> &'static [Pathway] {
        use Pathway::*;
        match self {
            Self::Import(_) => &[HostApi, HandleStore, ComponentStore, HelperApi, Canvas],
            Self::UpdateNode { .. } => {
                &[HostApi, HandleStore, ComponentStore, HelperApi, NodeComponent]
            }
            Self::AddNode(_) | Self::RemoveNode(_) | Self::AddConnection(_) => {
                &[HostApi, HandleStore, ComponentStore, HelperApi, Canvas]
            }
            Self::UpdateConnection { .. } => &[HandleStore, ComponentStore, HelperApi],
            Self::RemoveConnection(_) => &[HandleStore, ComponentStore, HelperApi, Canvas],
        }
    }

    /// Method name on the host API and helper objects.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Import(_) => "importWorkflow",
            Self::UpdateNode { .. } => "updateNode",
            Self::AddNode(_) => "addNode",
            Self::RemoveNode(_) => "removeNode",
            Self::UpdateConnection { .. } => "updateConnection",
            Self::AddConnection(_) => "addConnection",
            Self::RemoveConnection(_) => "removeConnection",
        }
    }

    /// Member of the host instance that carries [`Self::method`].
    pub fn api_namespace(&self) -> &'static str {
        match self {
            Self::Import(_) => "workflows",
            _ => "nodeHelpers",
        }
    }

    /// Positional arguments for the host API and helper methods.
    pub fn api_args(&self) -> Vec<Value> {
        match self {
            Self::Import(workflow) => vec![workflow.clone()],
            Self::UpdateNode { node_id, data } => vec![node_id.clone(), data.clone()],
            Self::AddNode(data) => vec![field(data, "type"), field(data, "position"), data.clone()],
            Self::RemoveNode(node_id) => vec![node_id.clone()],
            Self::UpdateConnection {
                connection_id,
                data,
            } => vec![connection_id.clone(), data.clone()],
            Self::AddConnection(data) => vec![data.clone()],
            Self::RemoveConnection(connection_id) => vec![connection_id.clone()],
        }
    }

    /// `(action, payload)` for a store `dispatch`.
    pub fn store_dispatch(&self) -> Vec<Value> {
        let payload = match self {
            Self::Import(workflow) => json!({ "workflow": workflow }),
            Self::UpdateNode { node_id, data } => {
                json!({ "nodeId": node_id, "updateInformation": data })
            }
            Self::AddNode(data) | Self::AddConnection(data) => json!({ "data": data }),
            Self::RemoveNode(node_id) => json!({ "nodeId": node_id }),
            Self::UpdateConnection {
                connection_id,
                data,
            } => json!({ "connectionId": connection_id, "updateInformation": data }),
            Self::RemoveConnection(connection_id) => json!({ "connectionId": connection_id }),
        };
        vec![json!(format!("workflows/{}", self.method())), payload]
    }

    /// Canvas component method for single-element edits.
    pub fn canvas_method(&self) -> Option<&'static str> {
        match self {
            Self::AddNode(_) => Some("addNodeToCanvas"),
            Self::RemoveNode(_) => Some("removeNodeFromCanvas"),
            Self::AddConnection(_) => Some("addConnection"),
            Self::RemoveConnection(_) => Some("removeConnection"),
            _ => None,
        }
    }

    /// Error reported once every pathway was unavailable.
    pub fn exhausted_message(&self) -> String {
        let what = match self {
            Self::Import(_) => "apply the workflow",
            Self::UpdateNode { .. } => "update the node",
            Self::AddNode(_) => "add the node",
            Self::RemoveNode(_) => "remove the node",
            Self::UpdateConnection { .. } => "update the connection",
            Self::AddConnection(_) => "add the connection",
            Self::RemoveConnection(_) => "remove the connection",
        };
        format!("could not {} with any available method", what)
    }
}

fn field(data: &Value, key: &str) -> Value {
    data.get(key).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_kind_is_rejected() {
        let change = ChangeOperation::new(ChangeKind::Unsupported("rename_node".to_string()));
        assert_eq!(
            Mutation::from_change(&change),
            Err("unsupported type: rename_node".to_string())
        );
    }

    #[test]
    fn test_add_node_api_args() {
        let data = json!({"type": "n8n-nodes-base.set", "position": [10, 20], "name": "Set"});
        let change = ChangeOperation::new(ChangeKind::AddNode).with_data(data.clone());
        let mutation = Mutation::from_change(&change).unwrap();
        assert_eq!(
            mutation.api_args(),
            vec![json!("n8n-nodes-base.set"), json!([10, 20]), data]
        );
    }

    #[test]
    fn test_update_node_store_payload() {
        let change = ChangeOperation::new(ChangeKind::UpdateNode)
            .with_node_id("4")
            .with_data(json!({"disabled": true}));
        let mutation = Mutation::from_change(&change).unwrap();
        assert_eq!(
            mutation.store_dispatch(),
            vec![
                json!("workflows/updateNode"),
                json!({"nodeId": "4", "updateInformation": {"disabled": true}})
            ]
        );
    }

    #[test]
    fn test_connection_updates_skip_host_api() {
        let change = ChangeOperation::new(ChangeKind::UpdateConnection)
            .with_connection_id(json!("c1"))
            .with_data(json!({}));
        let mutation = Mutation::from_change(&change).unwrap();
        assert!(!mutation.pathways().contains(&Pathway::HostApi));
        assert!(!mutation.pathways().contains(&Pathway::Canvas));
    }
}
