//! Workflow JSON embedded in DOM attributes, with a canvas reconstruction fallback.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use flowpilot_protocols::{ElementSnapshot, PageDom, PageError};
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::ExtractionStrategy;
use crate::validator::is_valid_workflow;

const PAYLOAD_SELECTORS: &[&str] = &[
    "[data-workflow]",
    "#workflow-data",
    ".workflow-data",
    "[data-test-id=\"workflow-data\"]",
    "script[type=\"application/json\"]",
    "meta[name=\"workflow-data\"]",
    "[data-id=\"workflow\"]",
    "[data-name=\"workflow\"]",
    ".workflow-information",
    "[data-workflow-id]",
];

const NODE_SELECTOR: &str = ".node-item, [data-node-id], [data-node-type]";

static TRANSLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"translate\((\d+)px,\s*(\d+)px\)").expect("valid translate regex")
});

pub struct DomAttributeStrategy {
    dom: Arc<dyn PageDom>,
}

impl DomAttributeStrategy {
    pub fn new(dom: Arc<dyn PageDom>) -> Self {
        Self { dom }
    }

    async fn embedded_payload(&self) -> Result<Option<Value>, PageError> {
        for selector in PAYLOAD_SELECTORS {
            for element in self.dom.query_all(selector).await? {
                let Some(text) = payload_text(&element) else {
                    continue;
                };
                match serde_json::from_str::<Value>(text) {
                    Ok(candidate) if is_valid_workflow(&candidate) => {
                        debug!("Workflow payload found under {}", selector);
                        return Ok(Some(candidate));
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Unparseable payload under {}: {}", selector, e),
                }
            }
        }
        Ok(None)
    }

    /// Rebuild a minimal graph from rendered node elements. Connections are
    /// inferred from connection elements keyed by source and target node id.
    async fn reconstruct(&self) -> Result<Option<Value>, PageError> {
        let elements = self.dom.query_all(NODE_SELECTOR).await?;
        if elements.is_empty() {
            return Ok(None);
        }

        let mut nodes = Vec::with_capacity(elements.len());
        let mut connections = Map::new();

        for (index, element) in elements.iter().enumerate() {
            let id = element
                .attr("data-node-id")
                .map(str::to_string)
                .unwrap_or_else(|| format!("node_{}", index));
            let name = node_label(element).unwrap_or_else(|| format!("Node {}", index));

            nodes.push(json!({
                "id": id,
                "name": name,
                "type": element.attr("data-node-type").unwrap_or("unknown"),
                "position": position(element),
                "parameters": {},
            }));

            let links_selector = format!(
                ".connection-link[data-source=\"{id}\"], .connection[data-source=\"{id}\"]"
            );
            let links = self.dom.query_all(&links_selector).await?;
            if links.is_empty() {
                continue;
            }

            let mut targets = Vec::new();
            for link in &links {
                let target_id = link.attr("data-target").unwrap_or_default();
                let target_selector = format!(".node-item[data-node-id=\"{}\"]", target_id);
                if let Some(target) = self.dom.query_all(&target_selector).await?.first() {
                    let target_name = node_label(target).unwrap_or_else(|| target_id.to_string());
                    targets.push(json!({"node": target_name, "type": "main", "index": 0}));
                }
            }
            connections.insert(name, json!({ "main": [targets] }));
        }

        debug!("Reconstructed {} nodes from the canvas", nodes.len());
        Ok(Some(json!({
            "nodes": nodes,
            "connections": connections,
            "active": true,
            "settings": {},
            "id": format!("reconstructed_{}", chrono::Utc::now().timestamp_millis()),
        })))
    }
}

#[async_trait]
impl ExtractionStrategy for DomAttributeStrategy {
    fn name(&self) -> &'static str {
        "dom-attribute"
    }

    async fn extract(&self) -> Option<Value> {
        let found = match self.embedded_payload().await {
            Ok(Some(workflow)) => return Some(workflow),
            Ok(None) => self.reconstruct().await,
            Err(e) => Err(e),
        };
        found.unwrap_or_else(|e| {
            debug!("DOM extraction failed: {}", e);
            None
        })
    }
}

/// `data-workflow`, else `content`, else the text content.
fn payload_text(element: &ElementSnapshot) -> Option<&str> {
    element
        .attr("data-workflow")
        .or_else(|| element.attr("content"))
        .or_else(|| Some(element.text.as_str()).filter(|t| !t.is_empty()))
}

fn node_label(element: &ElementSnapshot) -> Option<String> {
    element
        .label
        .as_deref()
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

fn position(element: &ElementSnapshot) -> Value {
    let parsed = element.transform.as_deref().and_then(|transform| {
        let captures = TRANSLATE.captures(transform)?;
        let x: i64 = captures[1].parse().ok()?;
        let y: i64 = captures[2].parse().ok()?;
        Some(json!([x, y]))
    });
    parsed.unwrap_or_else(|| json!([0, 0]))
}
