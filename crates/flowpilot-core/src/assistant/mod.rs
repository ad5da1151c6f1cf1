//! Workflow generation and change proposals through a chat provider.

mod parse;

use flowpilot_protocols::{ChangeOperation, ChatProvider, ChatTurn, ProviderError};
use serde_json::Value;
use tracing::{debug, info};

pub use self::parse::{changes_from_response, workflow_from_response};

const GENERATE_PROMPT: &str = "You are an expert in n8n, a low-code automation platform. \
Answer with a complete n8n workflow as JSON inside a ```json fence. The document must have \
a \"nodes\" array (each node with id, name, type, typeVersion, position and parameters) and \
a \"connections\" object keyed by source node name.";

const ANALYZE_PROMPT: &str = "You are an expert in n8n, a low-code automation platform. \
Review the workflow you are given and recommend concrete improvements. Structure the answer \
as a short summary, findings per focus area, and a numbered list of changes.";

const CHANGES_PROMPT: &str = "You are an expert in n8n, a low-code automation platform. \
Turn the analysis you are given into machine-readable edits. Answer with JSON of the form \
{\"changes\": [{\"type\": \"update_node\", \"nodeId\": \"...\", \"data\": {}}]}. Valid types are \
update_node, add_node, remove_node, update_connection, add_connection and remove_connection.";

/// Areas a workflow review should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisFocus {
    pub performance: bool,
    pub security: bool,
    pub structure: bool,
    pub errors: bool,
}

impl Default for AnalysisFocus {
    fn default() -> Self {
        Self {
            performance: true,
            security: true,
            structure: true,
            errors: true,
        }
    }
}

impl AnalysisFocus {
    fn areas(&self) -> Vec<&'static str> {
        [
            (self.performance, "performance and resource usage"),
            (self.security, "security and credential handling"),
            (self.structure, "structure and organization"),
            (self.errors, "likely errors and failure points"),
        ]
        .into_iter()
        .filter_map(|(on, area)| on.then_some(area))
        .collect()
    }
}

/// A generated workflow and the reply it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWorkflow {
    pub text: String,
    /// `None` when the reply held no valid workflow.
    pub workflow: Option<Value>,
}

/// Proposed edits and the reply they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeProposal {
    pub text: String,
    /// `None` when the reply held no `changes` list.
    pub changes: Option<Vec<ChangeOperation>>,
}

pub struct Assistant<P: ChatProvider> {
    provider: P,
}

impl<P: ChatProvider> Assistant<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ask for a workflow matching `description`.
    pub async fn generate(
        &self,
        description: &str,
        history: &[ChatTurn],
    ) -> Result<GeneratedWorkflow, ProviderError> {
        let prompt = format!("Generate an n8n workflow for: {}", description);
        let text = self.complete(GENERATE_PROMPT, &prompt, history).await?;
        let workflow = workflow_from_response(&text);
        if workflow.is_some() {
            info!("Assistant produced a workflow");
        }
        Ok(GeneratedWorkflow { text, workflow })
    }

    /// Free-text review of `workflow_json`.
    pub async fn analyze(
        &self,
        workflow_json: &str,
        focus: AnalysisFocus,
    ) -> Result<String, ProviderError> {
        let system = format!("{} Focus on: {}.", ANALYZE_PROMPT, focus.areas().join(", "));
        let prompt = format!("Analyze this n8n workflow:\n\n```json\n{}\n```", workflow_json);
        self.complete(&system, &prompt, &[]).await
    }

    /// Turn an analysis into change operations against `workflow_json`.
    pub async fn propose_changes(
        &self,
        analysis: &str,
        workflow_json: &str,
    ) -> Result<ChangeProposal, ProviderError> {
        let prompt = format!(
            "Based on this analysis:\n\n{}\n\nGenerate the changes to apply to the original workflow:\n\n```json\n{}\n```",
            analysis, workflow_json
        );
        let text = self.complete(CHANGES_PROMPT, &prompt, &[]).await?;
        let changes = changes_from_response(&text);
        Ok(ChangeProposal { text, changes })
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        history: &[ChatTurn],
    ) -> Result<String, ProviderError> {
        debug!(
            "Calling provider {} with {} prior turns",
            self.provider.id(),
            history.len()
        );
        let text = self.provider.complete(system, prompt, history).await?;
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse(self.provider.id().to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
#[path = "assistant_tests.rs"]
mod tests;
