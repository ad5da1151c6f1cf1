//! Workflow held in the host page's globals, storage or component stores.

use async_trait::async_trait;
use flowpilot_protocols::{ObjectRef, PageError, PageWorld};
use serde_json::Value;
use tracing::{debug, warn};

use super::ExtractionStrategy;
use crate::world::{WorldClient, global_path, walk};

const HOST_GLOBALS: &[&str] = &["n8n", "$n8n"];
const STORAGE_KEYWORDS: &[&str] = &["workflow", "n8n"];
const CANVAS_SELECTOR: &str = ".workflow-canvas, .n8n-workflow";

/// Reads the current workflow through the page agent, bounded by the
/// global-read timeout.
pub struct GlobalStateStrategy {
    world: WorldClient,
}

impl GlobalStateStrategy {
    pub fn new(world: WorldClient) -> Self {
        Self { world }
    }
}

#[async_trait]
impl ExtractionStrategy for GlobalStateStrategy {
    fn name(&self) -> &'static str {
        "global-state"
    }

    async fn extract(&self) -> Option<Value> {
        self.world.read_globals().await
    }
}

/// Runs in the host-page context. Returns the first hit among the
/// lookups below, or `None` on a miss or a page error.
pub(crate) async fn lookup(page: &dyn PageWorld) -> Option<Value> {
    match try_lookup(page).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Global workflow lookup failed: {}", e);
            None
        }
    }
}

async fn try_lookup(page: &dyn PageWorld) -> Result<Option<Value>, PageError> {
    for &name in HOST_GLOBALS {
        if let Some(accessor) = global_path(page, &[name, "workflow"]).await? {
            if let Some(workflow) = read_accessor(page, &accessor).await? {
                debug!("Workflow found on window.{}.workflow", name);
                return Ok(Some(workflow));
            }
        }
    }

    if let Some(workflow) = from_storage(page).await? {
        return Ok(Some(workflow));
    }

    if let Some(current) =
        global_path(page, &["__INITIAL_STATE__", "workflows", "currentWorkflow"]).await?
    {
        if let Some(workflow) = page.snapshot(&current).await? {
            debug!("Workflow found in the initial state");
            return Ok(Some(workflow));
        }
    }

    if let Some(component) = page.first_component(Some("$store")).await? {
        let path = ["$store", "state", "workflows", "currentWorkflow"];
        if let Some(current) = walk(page, &component, &path).await? {
            if let Some(workflow) = page.snapshot(&current).await? {
                debug!("Workflow found in a component store");
                return Ok(Some(workflow));
            }
        }
    }

    if let Some(workflow) = from_canvas_dataset(page).await? {
        return Ok(Some(workflow));
    }

    from_window_scan(page).await
}

/// `getCurrentWorkflow()` when the accessor has it, else the accessor itself.
async fn read_accessor(
    page: &dyn PageWorld,
    accessor: &ObjectRef,
) -> Result<Option<Value>, PageError> {
    let value = if page.is_callable(accessor, "getCurrentWorkflow").await? {
        Some(page.invoke(accessor, "getCurrentWorkflow", Vec::new()).await?)
    } else {
        page.snapshot(accessor).await?
    };
    Ok(value.filter(|v| !v.is_null()))
}

async fn from_storage(page: &dyn PageWorld) -> Result<Option<Value>, PageError> {
    for (key, raw) in page.storage_entries().await? {
        if !STORAGE_KEYWORDS.iter().any(|k| key.contains(*k)) {
            continue;
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(candidate) if has_node_array(&candidate) => {
                debug!("Workflow found in local storage under {}", key);
                return Ok(Some(candidate));
            }
            Ok(_) => {}
            Err(e) => debug!("Storage entry {} is not JSON: {}", key, e),
        }
    }
    Ok(None)
}

/// `dataset` entries of the canvas root named like a workflow.
async fn from_canvas_dataset(page: &dyn PageWorld) -> Result<Option<Value>, PageError> {
    let canvases = page.query_all(CANVAS_SELECTOR).await?;
    let Some(canvas) = canvases.first() else {
        return Ok(None);
    };
    for (key, raw) in canvas.dataset() {
        if !(key.contains("workflow") || key == "nodes") {
            continue;
        }
        if let Ok(candidate) = serde_json::from_str::<Value>(raw) {
            if candidate.get("nodes").is_some() || candidate.get("connections").is_some() {
                debug!("Workflow found in canvas data-{}", key);
                return Ok(Some(candidate));
            }
        }
    }
    Ok(None)
}

/// Any global named like a workflow whose value carries a nodes array.
async fn from_window_scan(page: &dyn PageWorld) -> Result<Option<Value>, PageError> {
    for name in page.global_names().await? {
        let lower = name.to_lowercase();
        if !STORAGE_KEYWORDS.iter().any(|k| lower.contains(*k)) {
            continue;
        }
        let Ok(Some(object)) = page.global(&name).await else {
            continue;
        };
        if let Ok(Some(candidate)) = page.snapshot(&object).await {
            if has_node_array(&candidate) {
                debug!("Workflow found by scanning window.{}", name);
                return Ok(Some(candidate));
            }
        }
    }
    Ok(None)
}

fn has_node_array(value: &Value) -> bool {
    value.get("nodes").is_some_and(Value::is_array)
}
