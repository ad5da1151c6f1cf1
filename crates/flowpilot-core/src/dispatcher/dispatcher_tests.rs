use super::*;
use crate::test_support::{FakePage, Method};
use flowpilot_protocols::{ChangeKind, ObjectRef};
use serde_json::json;

fn instance(path: &str) -> HostHandle {
    HostHandle::Instance(ObjectRef::new(path))
}

fn sample_workflow() -> Value {
    json!({
        "nodes": [
            {"id": "1", "name": "Start", "type": "trigger", "position": [0, 0], "parameters": {}},
            {"id": "2", "name": "Send", "type": "slack", "position": [200, 0], "parameters": {}}
        ],
        "connections": {"Start": {"main": [[{"node": "Send", "type": "main", "index": 0}]]}}
    })
}

#[tokio::test]
async fn test_import_prefers_host_api_over_store() {
    let page = FakePage::new()
        .with_method("n8n.workflows", "importWorkflow", Method::Returns(Value::Null))
        .with_method("n8n.$store", "dispatch", Method::Returns(Value::Null));

    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("n8n"), &sample_workflow())
        .await;

    assert!(result.success);
    assert_eq!(page.calls_to("importWorkflow").len(), 1);
    assert!(page.calls_to("dispatch").is_empty());
}

#[tokio::test]
async fn test_import_falls_back_to_handle_store() {
    let page = FakePage::new().with_method("n8n.$store", "dispatch", Method::Returns(Value::Null));

    let workflow = sample_workflow();
    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("n8n"), &workflow)
        .await;

    assert!(result.success);
    let calls = page.calls_to("dispatch");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        vec![json!("workflows/importWorkflow"), json!({"workflow": workflow})]
    );
}

#[tokio::test]
async fn test_import_through_component_store() {
    let page = FakePage::new()
        .with_object("n8n", json!({}))
        .with_component("@app", json!({}))
        .with_method("@app.$store", "dispatch", Method::Returns(Value::Null));

    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("n8n"), &sample_workflow())
        .await;

    assert!(result.success);
    assert_eq!(page.calls_to("dispatch")[0].object, "@app.$store");
}

#[tokio::test]
async fn test_import_through_helper_object() {
    let page = FakePage::new()
        .with_object("n8n", json!({}))
        .with_method("n8nWorkflowHelpers", "importWorkflow", Method::Returns(Value::Null));

    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("n8n"), &sample_workflow())
        .await;

    assert!(result.success);
    assert_eq!(page.calls_to("importWorkflow")[0].object, "n8nWorkflowHelpers");
}

#[tokio::test]
async fn test_import_rebuilds_canvas() {
    use flowpilot_protocols::ElementSnapshot;

    let page = FakePage::new()
        .with_element_component(".workflow-canvas", "@canvas")
        .with_method("@canvas", "removeNode", Method::Returns(Value::Null))
        .with_method("@canvas", "addNodeToCanvas", Method::Returns(Value::Null))
        .with_method("@canvas", "addConnection", Method::Returns(Value::Null))
        .with_elements(
            ".node-item",
            vec![
                ElementSnapshot::new("div").with_attr("data-node-id", "old-1"),
                ElementSnapshot::new("div").with_attr("id", "old-2"),
            ],
        );

    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("@canvas"), &sample_workflow())
        .await;

    assert!(result.success);
    let removed: Vec<_> = page
        .calls_to("removeNode")
        .into_iter()
        .map(|c| c.args[0].clone())
        .collect();
    assert_eq!(removed, vec![json!("old-1"), json!("old-2")]);

    let added = page.calls_to("addNodeToCanvas");
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].args[0], json!("trigger"));
    assert_eq!(added[0].args[1], json!([0, 0]));

    let links = page.calls_to("addConnection");
    assert_eq!(
        links[0].args,
        vec![json!({"source": "Start", "sourceIndex": 0, "target": "Send", "targetIndex": 0})]
    );
}

#[tokio::test]
async fn test_import_with_no_pathway_fails() {
    let page = FakePage::new().with_object("n8n", json!({}));
    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("n8n"), &sample_workflow())
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("could not apply the workflow with any available method")
    );
}

#[tokio::test]
async fn test_first_available_pathway_outcome_is_final() {
    let page = FakePage::new()
        .with_method("n8n.workflows", "importWorkflow", Method::Fails("import rejected".to_string()))
        .with_method("n8n.$store", "dispatch", Method::Returns(Value::Null));

    let result = Dispatcher::default()
        .apply_workflow(&page, &instance("n8n"), &sample_workflow())
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("import rejected"));
    assert!(page.calls_to("dispatch").is_empty());
}

#[tokio::test]
async fn test_changes_continue_past_unsupported_type() {
    let page = FakePage::new()
        .with_method("n8n.nodeHelpers", "updateNode", Method::Returns(Value::Null))
        .with_method("n8n.nodeHelpers", "removeNode", Method::Fails("node is locked".to_string()));

    let changes = vec![
        ChangeOperation::new(ChangeKind::UpdateNode)
            .with_node_id("1")
            .with_data(json!({"name": "Begin"})),
        ChangeOperation::new(ChangeKind::Unsupported("rename_everything".to_string())),
        ChangeOperation::new(ChangeKind::RemoveNode).with_node_id("2"),
    ];

    let result = Dispatcher::default()
        .apply_changes(&page, &instance("n8n"), &changes, None)
        .await;

    assert!(!result.success);
    assert_eq!(page.calls_to("updateNode").len(), 1);
    assert_eq!(page.calls_to("removeNode").len(), 1);

    let error = result.error.unwrap();
    let parts: Vec<&str> = error.split(", ").collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], "unsupported type: rename_everything");
    assert!(parts[1].contains("node is locked"));
}

#[tokio::test]
async fn test_all_changes_succeeding_is_success() {
    let page = FakePage::new()
        .with_method("n8n.nodeHelpers", "addNode", Method::Returns(Value::Null))
        .with_method("n8n.nodeHelpers", "addConnection", Method::Returns(Value::Null));

    let node = json!({"name": "Wait", "type": "n8n-nodes-base.wait", "position": [300, 0]});
    let link = json!({"source": "Start", "target": "Wait"});
    let changes = vec![
        ChangeOperation::new(ChangeKind::AddNode).with_data(node.clone()),
        ChangeOperation::new(ChangeKind::AddConnection).with_data(link.clone()),
    ];

    let result = Dispatcher::default()
        .apply_changes(&page, &instance("n8n"), &changes, Some(&sample_workflow()))
        .await;

    assert_eq!(result, ApplyResult::ok());
    assert_eq!(
        page.calls_to("addNode")[0].args,
        vec![json!("n8n-nodes-base.wait"), json!([300, 0]), node]
    );
    assert_eq!(page.calls_to("addConnection")[0].args, vec![link]);
}

#[tokio::test]
async fn test_update_node_assigns_component_props() {
    let page = FakePage::new()
        .with_object("n8n", json!({}))
        .with_element_component("[data-node-id=\"7\"]", "@node7");

    let changes = vec![
        ChangeOperation::new(ChangeKind::UpdateNode)
            .with_node_id("7")
            .with_data(json!({"disabled": true})),
    ];
    let result = Dispatcher::default()
        .apply_changes(&page, &instance("n8n"), &changes, None)
        .await;

    assert!(result.success);
    assert_eq!(
        page.assignments(),
        vec![("@node7".to_string(), "disabled".to_string(), json!(true))]
    );
}

#[tokio::test]
async fn test_store_handle_dispatches_connection_removal() {
    let page = FakePage::new().with_method("@app.$store", "dispatch", Method::Returns(Value::Null));
    let handle = HostHandle::Store(ObjectRef::new("@app.$store"));

    let changes = vec![
        ChangeOperation::new(ChangeKind::RemoveConnection).with_connection_id(json!({"source": "A"})),
    ];
    let result = Dispatcher::default()
        .apply_changes(&page, &handle, &changes, None)
        .await;

    assert!(result.success);
    assert_eq!(
        page.calls_to("dispatch")[0].args,
        vec![
            json!("workflows/removeConnection"),
            json!({"connectionId": {"source": "A"}})
        ]
    );
}

#[tokio::test]
async fn test_canvas_add_node_requires_method() {
    let page = FakePage::new()
        .with_object("n8n", json!({}))
        .with_element_component(".workflow-canvas", "@canvas");

    let changes = vec![ChangeOperation::new(ChangeKind::AddNode).with_data(json!({"type": "x"}))];
    let result = Dispatcher::default()
        .apply_changes(&page, &instance("n8n"), &changes, None)
        .await;

    assert_eq!(
        result.error.as_deref(),
        Some("could not add the node with any available method")
    );
}
