use super::*;

use async_trait::async_trait;
use flowpilot_protocols::ChangeKind;
use parking_lot::Mutex;

/// Replies with a fixed answer and records what it was asked.
struct CannedProvider {
    reply: Result<String, String>,
    prompts: Mutex<Vec<(String, String, usize)>>,
}

impl CannedProvider {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            reply: Err("API key not set".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatProvider for CannedProvider {
    fn id(&self) -> &str {
        "canned"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        history: &[ChatTurn],
    ) -> Result<String, ProviderError> {
        self.prompts.lock().push((
            system_prompt.to_string(),
            user_prompt.to_string(),
            history.len(),
        ));
        self.reply.clone().map_err(ProviderError::Configuration)
    }
}

#[tokio::test]
async fn test_generate_extracts_workflow() {
    let reply = "Done.\n```json\n{\"nodes\": [{\"name\": \"Webhook\"}], \"connections\": {}}\n```";
    let assistant = Assistant::new(CannedProvider::replying(reply));

    let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
    let generated = assistant.generate("receive a webhook", &history).await.unwrap();

    assert_eq!(generated.text, reply);
    assert_eq!(generated.workflow.unwrap()["nodes"][0]["name"], "Webhook");
    let prompts = assistant.provider().prompts.lock();
    assert!(prompts[0].1.contains("receive a webhook"));
    assert_eq!(prompts[0].2, 2);
}

#[tokio::test]
async fn test_generate_keeps_text_without_workflow() {
    let assistant = Assistant::new(CannedProvider::replying("I need more details."));
    let generated = assistant.generate("something", &[]).await.unwrap();
    assert_eq!(generated.workflow, None);
    assert_eq!(generated.text, "I need more details.");
}

#[tokio::test]
async fn test_configuration_error_is_surfaced() {
    let assistant = Assistant::new(CannedProvider::unconfigured());
    let err = assistant.generate("anything", &[]).await.unwrap_err();
    assert_eq!(err.to_string(), "Configuration error: API key not set");
}

#[tokio::test]
async fn test_blank_reply_is_an_error() {
    let assistant = Assistant::new(CannedProvider::replying("  \n"));
    let err = assistant.analyze("{}", AnalysisFocus::default()).await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse(id) if id == "canned"));
}

#[tokio::test]
async fn test_analysis_prompt_lists_focus_areas() {
    let assistant = Assistant::new(CannedProvider::replying("Looks fine."));
    let focus = AnalysisFocus {
        performance: false,
        errors: false,
        ..AnalysisFocus::default()
    };

    let text = assistant.analyze("{\"nodes\": []}", focus).await.unwrap();
    assert_eq!(text, "Looks fine.");

    let prompts = assistant.provider().prompts.lock();
    let system = &prompts[0].0;
    assert!(system.contains("security"));
    assert!(system.contains("structure"));
    assert!(!system.contains("performance"));
    assert!(prompts[0].1.contains("{\"nodes\": []}"));
}

#[tokio::test]
async fn test_propose_changes() {
    let reply = r#"{"changes": [{"type": "add_node", "data": {"name": "Set"}}]}"#;
    let assistant = Assistant::new(CannedProvider::replying(reply));

    let proposal = assistant
        .propose_changes("add a Set node", "{\"nodes\": []}")
        .await
        .unwrap();
    let changes = proposal.changes.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::AddNode);
}
