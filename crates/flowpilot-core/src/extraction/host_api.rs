//! Workflow fetched through the host's REST endpoint or frontend API.

use std::sync::LazyLock;

use async_trait::async_trait;
use flowpilot_protocols::{PageError, PageWorld};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::ExtractionStrategy;
use crate::world::{WorldClient, global_path};

static WORKFLOW_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"workflows/([^/]+)").expect("valid workflow id regex"));

/// Reads through the page agent, bounded by the API-read timeout.
pub struct HostApiStrategy {
    world: WorldClient,
}

impl HostApiStrategy {
    pub fn new(world: WorldClient) -> Self {
        Self { world }
    }
}

#[async_trait]
impl ExtractionStrategy for HostApiStrategy {
    fn name(&self) -> &'static str {
        "host-api"
    }

    async fn extract(&self) -> Option<Value> {
        self.world.read_host_api().await
    }
}

/// Workflow id encoded in the URL path, if any.
pub(crate) fn workflow_id(url: &str) -> Option<String> {
    let path = path_of(url);
    WORKFLOW_ID
        .captures(path)
        .map(|captures| captures[1].to_string())
}

/// Runs in the host-page context: `GET /rest/workflows/{id}`, then
/// `n8nApi.workflowsApi.getWorkflow(id)` if the request fails.
pub(crate) async fn lookup(page: &dyn PageWorld) -> Option<Value> {
    let url = match page.url().await {
        Ok(url) => url,
        Err(e) => {
            debug!("Page URL unavailable: {}", e);
            return None;
        }
    };
    let id = workflow_id(&url)?;

    match page.fetch_json(&format!("/rest/workflows/{}", id)).await {
        Ok(body) => return Some(unwrap_data(body)),
        Err(e) => debug!("REST lookup of workflow {} failed: {}", id, e),
    }

    match frontend_lookup(page, &id).await {
        Ok(found) => found,
        Err(e) => {
            debug!("Frontend API lookup of workflow {} failed: {}", id, e);
            None
        }
    }
}

async fn frontend_lookup(page: &dyn PageWorld, id: &str) -> Result<Option<Value>, PageError> {
    let Some(api) = global_path(page, &["n8nApi", "workflowsApi"]).await? else {
        return Ok(None);
    };
    if !page.is_callable(&api, "getWorkflow").await? {
        return Ok(None);
    }
    let body = page
        .invoke(&api, "getWorkflow", vec![Value::String(id.to_string())])
        .await?;
    Ok(Some(unwrap_data(body)))
}

/// The REST API wraps its payload as `{ "data": ... }`.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme
        .find('/')
        .map_or("", |start| &after_scheme[start..]);
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
