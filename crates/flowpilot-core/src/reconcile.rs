//! Change reconciliation between two workflow snapshots.
//!
//! Nodes are matched by `(name, type)`; names are not guaranteed unique, so a
//! duplicate name can mask a change on its twin.

use serde_json::{Map, Value};

/// Whether `new` differs from `old` enough to alert the user.
///
/// Checks short-circuit in order: node sequences present, node count, node
/// type multiset, node name multiset, total connection targets, then per-node
/// parameter keys and values. Malformed input counts as significant.
pub fn is_significant(old: &Value, new: &Value) -> bool {
    compare(old, new).unwrap_or(true)
}

/// `None` means the snapshots could not be compared.
fn compare(old: &Value, new: &Value) -> Option<bool> {
    let (Some(old_nodes), Some(new_nodes)) = (nodes(old), nodes(new)) else {
        return Some(true);
    };

    if old_nodes.len() != new_nodes.len() {
        return Some(true);
    }

    if sorted_field(old_nodes, "type")? != sorted_field(new_nodes, "type")? {
        return Some(true);
    }

    if sorted_field(old_nodes, "name")? != sorted_field(new_nodes, "name")? {
        return Some(true);
    }

    if connection_count(old.get("connections"))? != connection_count(new.get("connections"))? {
        return Some(true);
    }

    for old_node in old_nodes {
        let old_node = old_node.as_object()?;
        let twin = new_nodes.iter().filter_map(Value::as_object).find(|candidate| {
            candidate.get("name") == old_node.get("name")
                && candidate.get("type") == old_node.get("type")
        });
        let Some(new_node) = twin else {
            return Some(true);
        };
        if parameters_differ(old_node, new_node) {
            return Some(true);
        }
    }

    Some(false)
}

fn nodes(workflow: &Value) -> Option<&Vec<Value>> {
    workflow.get("nodes")?.as_array()
}

/// Sorted serialized values of one field across all nodes.
fn sorted_field(nodes: &[Value], field: &str) -> Option<Vec<String>> {
    let mut values = nodes
        .iter()
        .map(|node| {
            let node = node.as_object()?;
            serde_json::to_string(node.get(field).unwrap_or(&Value::Null)).ok()
        })
        .collect::<Option<Vec<_>>>()?;
    values.sort();
    Some(values)
}

/// Sum of targets over every source and output slot. Absent connections count zero.
fn connection_count(connections: Option<&Value>) -> Option<usize> {
    let Some(connections) = connections.filter(|c| !c.is_null()) else {
        return Some(0);
    };
    let mut count = 0;
    for group in connections.as_object()?.values() {
        let Some(main) = group.get("main").filter(|m| !m.is_null()) else {
            continue;
        };
        for slot in main.as_array()? {
            count += slot.as_array()?.len();
        }
    }
    Some(count)
}

/// Compared only when both sides carry parameters.
fn parameters_differ(old: &Map<String, Value>, new: &Map<String, Value>) -> bool {
    let (Some(old_params), Some(new_params)) = (
        old.get("parameters").and_then(Value::as_object),
        new.get("parameters").and_then(Value::as_object),
    ) else {
        return false;
    };

    let mut old_keys: Vec<&String> = old_params.keys().collect();
    let mut new_keys: Vec<&String> = new_params.keys().collect();
    old_keys.sort();
    new_keys.sort();
    if old_keys != new_keys {
        return true;
    }

    old_params
        .iter()
        .any(|(key, value)| new_params.get(key) != Some(value))
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
