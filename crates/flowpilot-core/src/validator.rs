//! Workflow schema gate.

use serde_json::Value;

/// True iff `candidate` is an object whose `nodes` field is an array.
///
/// Node shape is not inspected; downstream consumers tolerate partial data.
pub fn is_valid_workflow(candidate: &Value) -> bool {
    candidate
        .as_object()
        .and_then(|map| map.get("nodes"))
        .is_some_and(Value::is_array)
}

/// Parse JSON text and keep it only if it passes [`is_valid_workflow`].
pub fn parse_workflow(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(is_valid_workflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_empty_nodes() {
        assert!(is_valid_workflow(&json!({"nodes": []})));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(!is_valid_workflow(&json!({})));
        assert!(!is_valid_workflow(&Value::Null));
        assert!(!is_valid_workflow(&json!({"nodes": "x"})));
        assert!(!is_valid_workflow(&json!([{"nodes": []}])));
    }

    #[test]
    fn test_connections_are_optional() {
        assert!(is_valid_workflow(&json!({"nodes": [{"name": "A"}]})));
    }

    #[test]
    fn test_parse_workflow() {
        assert!(parse_workflow(r#"{"nodes":[],"connections":{}}"#).is_some());
        assert!(parse_workflow(r#"{"nodes":{}}"#).is_none());
        assert!(parse_workflow("{nodes: []").is_none());
    }
}
