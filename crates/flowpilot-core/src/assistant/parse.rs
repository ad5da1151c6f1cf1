//! Pulling JSON documents out of free-form assistant replies.
//!
//! Replies are searched in order for a ```` ```json ```` fence, a bare
//! fence, and finally a greedy brace span around the expected keys. The
//! first pattern that matches is the only one parsed.

use std::sync::LazyLock;

use flowpilot_protocols::ChangeOperation;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::validator::is_valid_workflow;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("valid json fence regex"));

static BARE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\n(.*?)\n```").expect("valid bare fence regex"));

static WORKFLOW_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{.*"nodes".*"connections".*\}"#).expect("valid workflow span regex")
});

static CHANGES_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)\{.*"changes".*\}"#).expect("valid changes span regex"));

fn embedded_json(text: &str, span: &Regex) -> Option<Value> {
    let candidate = JSON_FENCE
        .captures(text)
        .or_else(|| BARE_FENCE.captures(text))
        .and_then(|captures| captures.get(1))
        .or_else(|| span.find(text))?;

    match serde_json::from_str(candidate.as_str()) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Assistant reply carried malformed JSON: {}", e);
            None
        }
    }
}

/// The workflow embedded in a reply, if it passes the schema gate.
pub fn workflow_from_response(text: &str) -> Option<Value> {
    let workflow = embedded_json(text, &WORKFLOW_SPAN)?;
    if is_valid_workflow(&workflow) {
        Some(workflow)
    } else {
        debug!("Assistant reply JSON is not a workflow");
        None
    }
}

/// The `changes` list embedded in a reply.
pub fn changes_from_response(text: &str) -> Option<Vec<ChangeOperation>> {
    let mut document = embedded_json(text, &CHANGES_SPAN)?;
    let changes = document.get_mut("changes").map(Value::take)?;
    if !changes.is_array() {
        debug!("Assistant reply has no changes list");
        return None;
    }
    match ChangeOperation::list_from_value(changes) {
        Ok(changes) => Some(changes),
        Err(e) => {
            warn!("Assistant changes could not be read: {}", e);
            None
        }
    }
}
