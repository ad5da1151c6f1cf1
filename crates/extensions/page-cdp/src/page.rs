//! [`PageDom`] and [`PageWorld`] over a CDP page session.

use async_trait::async_trait;
use flowpilot_config::BrowserConfig;
use flowpilot_protocols::{
    ElementSnapshot, MutationBatch, MutationStream, ObjectRef, PageDom, PageError, PageWorld,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::CdpClient;
use crate::error::CdpError;
use crate::protocol::{BindingCalled, Incoming, RemoteObject};
use crate::scripts;
use crate::session::PageSession;

/// One attached editor tab.
pub struct CdpPage {
    session: PageSession,
    // Keeps the WebSocket receive loop alive.
    _client: CdpClient,
}

impl CdpPage {
    /// Connect to the browser and attach to the configured page.
    pub async fn attach(config: &BrowserConfig) -> Result<Self, CdpError> {
        let client = CdpClient::connect(&config.endpoint).await?;
        let target = client.find_page(config.target_url.as_deref()).await?;
        info!("Attaching to {} ({})", target.title, target.url);
        let session = client.attach(&target.id).await?;
        Ok(Self {
            session,
            _client: client,
        })
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    async fn read<T: DeserializeOwned>(&self, expression: &str) -> Result<T, PageError> {
        let value = self.session.evaluate(expression).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn handle_of(&self, expression: &str) -> Result<Option<ObjectRef>, PageError> {
        let remote = self.session.evaluate_handle(expression).await?;
        Ok(object_ref(&remote))
    }
}

fn object_ref(remote: &RemoteObject) -> Option<ObjectRef> {
    remote.handle().map(ObjectRef::new)
}

/// Decode one binding event into a mutation batch, if it is one.
fn mutation_batch(event: &Incoming) -> Option<MutationBatch> {
    if event.method.as_deref() != Some("Runtime.bindingCalled") {
        return None;
    }
    let binding: BindingCalled = serde_json::from_value(event.params.clone()?).ok()?;
    if binding.name != scripts::MUTATION_BINDING {
        return None;
    }
    match serde_json::from_str(&binding.payload) {
        Ok(batch) => Some(batch),
        Err(e) => {
            warn!("Malformed mutation batch: {}", e);
            None
        }
    }
}

#[async_trait]
impl PageDom for CdpPage {
    async fn url(&self) -> Result<String, PageError> {
        self.read(scripts::URL).await
    }

    async fn title(&self) -> Result<String, PageError> {
        self.read(scripts::TITLE).await
    }

    async fn page_text(&self) -> Result<String, PageError> {
        self.read(scripts::PAGE_TEXT).await
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError> {
        self.read(&scripts::query_all(selector)).await
    }

    async fn watch_mutations(&self) -> Result<MutationStream, PageError> {
        let mut events = self
            .session
            .take_events()
            .ok_or_else(|| PageError::Transport("mutations are already being watched".to_string()))?;

        self.session.add_binding(scripts::MUTATION_BINDING).await?;
        let installed: bool = self.read(&scripts::mutation_observer()).await?;
        debug!("Mutation observer installed: {}", installed);

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(batch) = mutation_batch(&event) {
                    if tx.send(batch).is_err() {
                        break;
                    }
                }
            }
            debug!("Mutation forwarding stopped");
        });
        Ok(rx)
    }
}

#[async_trait]
impl PageWorld for CdpPage {
    async fn global(&self, name: &str) -> Result<Option<ObjectRef>, PageError> {
        self.handle_of(&scripts::global(name)).await
    }

    async fn global_names(&self) -> Result<Vec<String>, PageError> {
        self.read(scripts::GLOBAL_NAMES).await
    }

    async fn property(
        &self,
        object: &ObjectRef,
        key: &str,
    ) -> Result<Option<ObjectRef>, PageError> {
        let remote = self
            .session
            .call_function_on_handle(object.as_str(), scripts::PROPERTY, vec![json!(key)])
            .await?;
        Ok(object_ref(&remote))
    }

    async fn is_callable(&self, object: &ObjectRef, method: &str) -> Result<bool, PageError> {
        let value = self
            .session
            .call_function_on(object.as_str(), scripts::IS_CALLABLE, vec![json!(method)])
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_function(&self, object: &ObjectRef) -> Result<bool, PageError> {
        let value = self
            .session
            .call_function_on(object.as_str(), scripts::IS_FUNCTION, Vec::new())
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn invoke(
        &self,
        object: &ObjectRef,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, PageError> {
        Ok(self
            .session
            .call_function_on(
                object.as_str(),
                scripts::INVOKE,
                vec![json!(method), Value::Array(args)],
            )
            .await?)
    }

    async fn assign(&self, object: &ObjectRef, key: &str, value: Value) -> Result<(), PageError> {
        self.session
            .call_function_on(object.as_str(), scripts::ASSIGN, vec![json!(key), value])
            .await?;
        Ok(())
    }

    async fn snapshot(&self, object: &ObjectRef) -> Result<Option<Value>, PageError> {
        let value = self
            .session
            .call_function_on(object.as_str(), scripts::SNAPSHOT, Vec::new())
            .await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn element_component(&self, selector: &str) -> Result<Option<ObjectRef>, PageError> {
        self.handle_of(&scripts::element_component(selector)).await
    }

    async fn first_component(
        &self,
        with_property: Option<&str>,
    ) -> Result<Option<ObjectRef>, PageError> {
        self.handle_of(&scripts::first_component(with_property)).await
    }

    async fn storage_entries(&self) -> Result<Vec<(String, String)>, PageError> {
        self.read(scripts::STORAGE_ENTRIES).await
    }

    async fn fetch_json(&self, path: &str) -> Result<Value, PageError> {
        self.session
            .evaluate(&scripts::fetch_json(path))
            .await
            .map_err(|e| PageError::Transport(e.to_string()))
    }

    async fn release(&self) -> Result<(), PageError> {
        debug!("Releasing host object handles");
        Ok(self.session.release_object_group().await?)
    }
}
