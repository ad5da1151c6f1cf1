//! Notification and persistence boundaries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A freshly extracted workflow, as announced to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowUpdate {
    /// JSON text of the graph.
    pub workflow: String,
    /// Whether the change warrants a user-visible alert.
    pub significant: bool,
}

/// Receives workflow updates produced by the scheduler.
#[async_trait]
pub trait WorkflowNotifier: Send + Sync {
    async fn workflow_updated(&self, update: WorkflowUpdate);
}

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn save(&self, key: &str, value: String) -> Result<(), StoreError>;
}
