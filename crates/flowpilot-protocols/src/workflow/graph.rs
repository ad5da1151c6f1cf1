//! Workflow graph document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The node/connection document an editor holds in memory.
///
/// Connections are keyed by the *source node name*, not its id, and each
/// target references its node by name too. Renaming a node therefore
/// breaks every connection that mentions it; this mirrors the host format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes in display/processing order.
    pub nodes: Vec<Node>,

    /// Source node name -> outgoing connections.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionGroup>,

    /// Advisory only.
    #[serde(default)]
    pub active: bool,

    /// Passed through unmodified.
    #[serde(default)]
    pub settings: Map<String, Value>,

    #[serde(default)]
    pub id: String,
}

impl WorkflowGraph {
    /// Create an empty graph with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            connections: BTreeMap::new(),
            active: false,
            settings: Map::new(),
            id: id.into(),
        }
    }

    /// Append a node.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a `main` connection from `source` output slot `output` to `target`.
    pub fn connect(mut self, source: &str, output: usize, target: &str) -> Self {
        let group = self.connections.entry(source.to_string()).or_default();
        while group.main.len() <= output {
            group.main.push(Vec::new());
        }
        group.main[output].push(ConnectionTarget::main(target, 0));
        self
    }

    /// Look up a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Total number of connection targets across all sources and slots.
    pub fn connection_count(&self) -> usize {
        self.connections
            .values()
            .flat_map(|group| group.main.iter())
            .map(Vec::len)
            .sum()
    }

    /// Convert to a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Serialize to JSON text, the only form a graph takes across a boundary.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A single workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within a graph.
    #[serde(default)]
    pub id: String,

    /// Join key for connections.
    #[serde(default)]
    pub name: String,

    /// Host-defined node kind.
    #[serde(rename = "type", default)]
    pub node_type: String,

    #[serde(default)]
    pub position: [f64; 2],

    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            position: [0.0, 0.0],
            parameters: Map::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = [x, y];
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// Outgoing connections of one source node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGroup {
    /// One entry per output slot; each slot lists its targets in order.
    #[serde(default)]
    pub main: Vec<Vec<ConnectionTarget>>,
}

/// One edge end-point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Target node *name*.
    pub node: String,

    #[serde(rename = "type", default = "default_connection_type")]
    pub connection_type: String,

    #[serde(default)]
    pub index: u32,
}

impl ConnectionTarget {
    pub fn main(node: impl Into<String>, index: u32) -> Self {
        Self {
            node: node.into(),
            connection_type: default_connection_type(),
            index,
        }
    }
}

fn default_connection_type() -> String {
    "main".to_string()
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
