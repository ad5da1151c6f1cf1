//! Workflow JSON shown in code blocks or typed into editable fields.

use std::sync::Arc;

use async_trait::async_trait;
use flowpilot_protocols::{PageDom, PageError};
use serde_json::Value;
use tracing::debug;

use super::ExtractionStrategy;
use crate::validator::parse_workflow;

const DISPLAY_SELECTOR: &str =
    "pre, code, .json-view, .json-data, .json-content, .workflow-json, .json-editor, .json-display";
const EDITABLE_SELECTOR: &str = "textarea, input[type=\"text\"], [contenteditable=\"true\"]";

pub struct VisibleJsonStrategy {
    dom: Arc<dyn PageDom>,
}

impl VisibleJsonStrategy {
    pub fn new(dom: Arc<dyn PageDom>) -> Self {
        Self { dom }
    }

    async fn scan(&self) -> Result<Option<Value>, PageError> {
        for element in self.dom.query_all(DISPLAY_SELECTOR).await? {
            let text = element.text.trim();
            if text.starts_with('{') && text.ends_with('}') {
                if let Some(workflow) = parse_workflow(text) {
                    return Ok(Some(workflow));
                }
            }
        }

        for element in self.dom.query_all(EDITABLE_SELECTOR).await? {
            let text = element.value_or_text();
            if text.contains("\"nodes\"") && text.contains("\"connections\"") {
                if let Some(workflow) = parse_workflow(text) {
                    return Ok(Some(workflow));
                }
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl ExtractionStrategy for VisibleJsonStrategy {
    fn name(&self) -> &'static str {
        "visible-json"
    }

    async fn extract(&self) -> Option<Value> {
        self.scan().await.unwrap_or_else(|e| {
            debug!("Visible JSON scan failed: {}", e);
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePage;
    use flowpilot_protocols::ElementSnapshot;

    #[tokio::test]
    async fn test_code_block() {
        let page = FakePage::new().with_elements(
            DISPLAY_SELECTOR,
            vec![
                ElementSnapshot::new("code").with_text("npm install"),
                ElementSnapshot::new("pre").with_text("  {\"nodes\": [], \"id\": \"pre\"}\n"),
            ],
        );
        let workflow = VisibleJsonStrategy::new(page.shared()).extract().await.unwrap();
        assert_eq!(workflow["id"], "pre");
    }

    #[tokio::test]
    async fn test_textarea_needs_both_keys() {
        let page = FakePage::new().with_elements(
            EDITABLE_SELECTOR,
            vec![
                ElementSnapshot::new("textarea").with_value("{\"nodes\": []}"),
                ElementSnapshot::new("textarea")
                    .with_value("{\"nodes\": [], \"connections\": {}, \"id\": \"typed\"}"),
            ],
        );
        let workflow = VisibleJsonStrategy::new(page.shared()).extract().await.unwrap();
        assert_eq!(workflow["id"], "typed");
    }

    #[tokio::test]
    async fn test_ignores_json_without_nodes() {
        let page = FakePage::new().with_elements(
            DISPLAY_SELECTOR,
            vec![ElementSnapshot::new("pre").with_text("{\"name\": \"package\"}")],
        );
        assert_eq!(VisibleJsonStrategy::new(page.shared()).extract().await, None);
    }
}
