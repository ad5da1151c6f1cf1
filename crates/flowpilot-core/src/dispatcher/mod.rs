//! Mutation dispatch against a located host instance.
//!
//! Every mutation carries an ordered list of [`Pathway`]s. The dispatcher
//! probes them in order and executes the first one the page supports; that
//! execution's outcome is the mutation's outcome. Change lists are applied
//! one operation at a time with no rollback.

mod mutation;
mod pathway;

use flowpilot_protocols::{ApplyResult, ChangeOperation, PageWorld};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::locator::{HostHandle, HostProfile, Locator};

use self::mutation::Mutation;
pub use self::pathway::Pathway;

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    locator: Locator,
}

impl Dispatcher {
    pub fn new(profile: HostProfile) -> Self {
        Self {
            locator: Locator::new(profile),
        }
    }

    /// Replace the editor's workflow.
    pub async fn apply_workflow(
        &self,
        page: &dyn PageWorld,
        handle: &HostHandle,
        workflow: &Value,
    ) -> ApplyResult {
        let result = self
            .apply(page, handle, &Mutation::Import(workflow.clone()))
            .await;
        if result.success {
            info!("Workflow applied");
        }
        result
    }

    /// Apply each change independently; success only if all succeed.
    pub async fn apply_changes(
        &self,
        page: &dyn PageWorld,
        handle: &HostHandle,
        changes: &[ChangeOperation],
        original: Option<&Value>,
    ) -> ApplyResult {
        if original.is_none() {
            debug!("Applying changes without the original workflow");
        }

        let mut errors = Vec::new();
        for change in changes {
            let result = match Mutation::from_change(change) {
                Ok(mutation) => self.apply(page, handle, &mutation).await,
                Err(e) => {
                    warn!("Skipping change: {}", e);
                    ApplyResult::failed(e)
                }
            };
            if !result.success {
                errors.push(result.error.unwrap_or_else(|| "unknown error".to_string()));
            }
        }

        if errors.is_empty() {
            info!("Applied {} changes", changes.len());
            ApplyResult::ok()
        } else {
            warn!("{} of {} changes failed", errors.len(), changes.len());
            ApplyResult::failed(errors.join(", "))
        }
    }

    async fn apply(&self, page: &dyn PageWorld, handle: &HostHandle, mutation: &Mutation) -> ApplyResult {
        for pathway in mutation.pathways() {
            match pathway.probe(page, handle, &self.locator, mutation).await {
                Ok(Some(plan)) => {
                    debug!("{} via {}", mutation.method(), pathway);
                    return match plan.execute(page).await {
                        Ok(()) => ApplyResult::ok(),
                        Err(e) => {
                            warn!("{} via {} failed: {}", mutation.method(), pathway, e);
                            ApplyResult::failed(e.to_string())
                        }
                    };
                }
                Ok(None) => debug!("{} unavailable for {}", pathway, mutation.method()),
                Err(e) => debug!("Probing {} for {} failed: {}", pathway, mutation.method(), e),
            }
        }
        ApplyResult::failed(mutation.exhausted_message())
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
