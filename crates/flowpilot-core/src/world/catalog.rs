//! Node type and credential catalogs read from the host.

use std::collections::BTreeSet;

use flowpilot_protocols::{CredentialSummary, ObjectRef, PageError, PageWorld};
use serde_json::Value;
use tracing::debug;

use super::{global_path, walk};

/// Node type names known to the editor.
///
/// Tries the component store's `nodeTypes` map, then the frontend
/// `nodeTypesApi`, then the `data-node-type` attributes on the canvas.
pub async fn node_types(page: &dyn PageWorld) -> Result<Vec<String>, String> {
    read_node_types(page).await.map_err(|e| e.to_string())
}

async fn read_node_types(page: &dyn PageWorld) -> Result<Vec<String>, PageError> {
    if let Some(types) = store_section(page, &["nodeTypes"]).await? {
        if let Some(map) = types.as_object().filter(|m| !m.is_empty()) {
            return Ok(map.keys().cloned().collect());
        }
    }

    if let Some(api) = frontend_api(page, "nodeTypesApi").await? {
        return Ok(match page.invoke(&api, "getNodeTypes", Vec::new()).await {
            Ok(response) => data_items(&response)
                .filter_map(|item| item.get("name")?.as_str().map(str::to_string))
                .collect(),
            Err(e) => {
                debug!("nodeTypesApi.getNodeTypes failed: {}", e);
                Vec::new()
            }
        });
    }

    let mut seen = BTreeSet::new();
    let mut types = Vec::new();
    for element in page.query_all(".node-item, [data-node-type]").await? {
        if let Some(node_type) = element.attr("data-node-type") {
            if seen.insert(node_type.to_string()) {
                types.push(node_type.to_string());
            }
        }
    }
    Ok(types)
}

/// Credentials configured in the editor, reduced to id, name and type.
pub async fn credentials(page: &dyn PageWorld) -> Result<Vec<CredentialSummary>, String> {
    read_credentials(page).await.map_err(|e| e.to_string())
}

async fn read_credentials(page: &dyn PageWorld) -> Result<Vec<CredentialSummary>, PageError> {
    if let Some(list) = store_section(page, &["credentials", "credentials"]).await? {
        let summaries: Vec<_> = list
            .as_array()
            .map(|items| items.iter().filter_map(summarize).collect())
            .unwrap_or_default();
        if !summaries.is_empty() {
            return Ok(summaries);
        }
    }

    if let Some(api) = frontend_api(page, "credentialsApi").await? {
        return Ok(match page.invoke(&api, "getAll", Vec::new()).await {
            Ok(response) => data_items(&response).filter_map(summarize).collect(),
            Err(e) => {
                debug!("credentialsApi.getAll failed: {}", e);
                Vec::new()
            }
        });
    }

    Ok(Vec::new())
}

/// `$store.state.<path>` of the first component that carries a store.
async fn store_section(page: &dyn PageWorld, path: &[&str]) -> Result<Option<Value>, PageError> {
    let Some(component) = page.first_component(Some("$store")).await? else {
        return Ok(None);
    };
    let mut keys = vec!["$store", "state"];
    keys.extend_from_slice(path);
    match walk(page, &component, &keys).await? {
        Some(section) => page.snapshot(&section).await,
        None => Ok(None),
    }
}

/// `window.n8nApi.<name>`.
async fn frontend_api(page: &dyn PageWorld, name: &str) -> Result<Option<ObjectRef>, PageError> {
    global_path(page, &["n8nApi", name]).await
}

fn data_items(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn summarize(item: &Value) -> Option<CredentialSummary> {
    let id = match item.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(CredentialSummary {
        id,
        name: item.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
        credential_type: item.get("type").and_then(Value::as_str).unwrap_or_default().to_string(),
    })
}
