use super::*;
use serde_json::json;

#[test]
fn test_known_kinds_parse() {
    let ops: Vec<ChangeOperation> = serde_json::from_value(json!([
        {"type": "update_node", "nodeId": "1", "data": {"name": "Renamed"}},
        {"type": "add_connection", "data": {"source": "A", "target": "B"}},
        {"type": "remove_connection", "connectionId": {"source": "A", "target": "B"}}
    ]))
    .unwrap();

    assert_eq!(ops[0].kind, ChangeKind::UpdateNode);
    assert_eq!(ops[0].node_id_text().as_deref(), Some("1"));
    assert_eq!(ops[1].kind, ChangeKind::AddConnection);
    assert_eq!(ops[2].connection_id.as_ref().unwrap()["target"], "B");
}

#[test]
fn test_unknown_kind_is_kept() {
    let op: ChangeOperation =
        serde_json::from_value(json!({"type": "rename_workflow", "data": {}})).unwrap();
    assert_eq!(op.kind, ChangeKind::Unsupported("rename_workflow".to_string()));
    assert_eq!(op.kind.to_string(), "rename_workflow");
}

#[test]
fn test_numeric_node_id() {
    let op: ChangeOperation =
        serde_json::from_value(json!({"type": "remove_node", "nodeId": 42})).unwrap();
    assert_eq!(op.node_id_text().as_deref(), Some("42"));
}

#[test]
fn test_serialize_uses_wire_names() {
    let op = ChangeOperation::new(ChangeKind::RemoveNode).with_node_id("n-3");
    let value = serde_json::to_value(&op).unwrap();
    assert_eq!(value, json!({"type": "remove_node", "nodeId": "n-3"}));
}

#[test]
fn test_entry_without_type_stays_in_the_list() {
    let ops = ChangeOperation::list_from_value(json!([
        {"type": "update_node", "nodeId": "1", "data": {"name": "Begin"}},
        {"nodeId": "2"},
        {"type": 7, "nodeId": "3"},
        "remove everything",
        {"type": "remove_node", "nodeId": "4", "data": null}
    ]))
    .unwrap();

    assert_eq!(ops.len(), 5);
    assert_eq!(ops[0].kind, ChangeKind::UpdateNode);
    assert_eq!(ops[0].data, Some(json!({"name": "Begin"})));
    assert_eq!(ops[1].kind, ChangeKind::Unsupported("undefined".to_string()));
    assert_eq!(ops[1].node_id_text().as_deref(), Some("2"));
    assert_eq!(ops[2].kind, ChangeKind::Unsupported("7".to_string()));
    assert_eq!(
        ops[3].kind,
        ChangeKind::Unsupported("\"remove everything\"".to_string())
    );
    assert_eq!(ops[4].kind, ChangeKind::RemoveNode);
    assert_eq!(ops[4].data, None);
}

#[test]
fn test_list_must_be_an_array() {
    assert!(ChangeOperation::list_from_value(json!({"type": "remove_node"})).is_err());
}
