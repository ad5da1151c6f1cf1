//! Regex scan of the rendered page text.
//!
//! Best effort only. The non-greedy pattern can stop at the first closing
//! brace after the nodes array and cut a larger document short, and any
//! JSON-looking snippet that mentions both keys will match. Callers must
//! not depend on this strategy finding a workflow that is on screen.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use flowpilot_protocols::PageDom;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::ExtractionStrategy;
use crate::validator::is_valid_workflow;

static WORKFLOW_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{.*?"nodes"\s*:\s*\[.*?\].*?\}"#).expect("valid workflow shape regex")
});

pub struct PageTextStrategy {
    dom: Arc<dyn PageDom>,
}

impl PageTextStrategy {
    pub fn new(dom: Arc<dyn PageDom>) -> Self {
        Self { dom }
    }
}

#[async_trait]
impl ExtractionStrategy for PageTextStrategy {
    fn name(&self) -> &'static str {
        "page-text"
    }

    async fn extract(&self) -> Option<Value> {
        let text = match self.dom.page_text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("Page text unavailable: {}", e);
                return None;
            }
        };
        find_workflow(&text)
    }
}

/// Longest match mentioning both `"nodes"` and `"connections"`, with
/// control characters stripped before parsing.
fn find_workflow(text: &str) -> Option<Value> {
    let longest = WORKFLOW_SHAPE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|m| m.contains("\"nodes\"") && m.contains("\"connections\""))
        .max_by_key(|m| m.len())?;

    let cleaned: String = longest.chars().filter(|c| !is_control(*c)).collect();
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(candidate) if is_valid_workflow(&candidate) => Some(candidate),
        Ok(_) => None,
        Err(e) => {
            warn!("Workflow-shaped page text did not parse: {}", e);
            None
        }
    }
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}
