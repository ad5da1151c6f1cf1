//! Workflow update notifiers and an in-process key-value store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowpilot_protocols::{KeyValueStore, StoreError, WorkflowNotifier, WorkflowUpdate};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Storage key of the latest extracted workflow.
pub const CURRENT_WORKFLOW_KEY: &str = "currentWorkflow";

/// Logs every update; significant ones at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl WorkflowNotifier for LogNotifier {
    async fn workflow_updated(&self, update: WorkflowUpdate) {
        if update.significant {
            info!("Workflow changed ({} bytes)", update.workflow.len());
        } else {
            debug!("Workflow refreshed without significant changes");
        }
    }
}

/// Forwards updates into a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<WorkflowUpdate>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<WorkflowUpdate>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WorkflowUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl WorkflowNotifier for ChannelNotifier {
    async fn workflow_updated(&self, update: WorkflowUpdate) {
        if self.tx.send(update).is_err() {
            debug!("Workflow update receiver is gone");
        }
    }
}

/// Saves the latest workflow under [`CURRENT_WORKFLOW_KEY`], then forwards
/// the update to the next notifier, if any.
pub struct PersistingNotifier<S: KeyValueStore> {
    store: S,
    next: Option<Arc<dyn WorkflowNotifier>>,
}

impl<S: KeyValueStore> PersistingNotifier<S> {
    pub fn new(store: S) -> Self {
        Self { store, next: None }
    }

    pub fn then(mut self, next: Arc<dyn WorkflowNotifier>) -> Self {
        self.next = Some(next);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: KeyValueStore> WorkflowNotifier for PersistingNotifier<S> {
    async fn workflow_updated(&self, update: WorkflowUpdate) {
        if let Err(e) = self
            .store
            .save(CURRENT_WORKFLOW_KEY, update.workflow.clone())
            .await
        {
            warn!("Failed to persist workflow: {}", e);
        }
        if let Some(next) = &self.next {
            next.workflow_updated(update).await;
        }
    }
}

/// Key-value store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn save(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}
