//! Request/response entry point for collaborators.
//!
//! Workflows leave the router as JSON text. Mutating commands are guarded:
//! a second `applyWorkflow`/`applyChanges` while one is in flight is
//! rejected rather than queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flowpilot_protocols::{ApplyResult, ChangeOperation, JsonPayload, Request, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::session::{ExtractOutcome, Session};

const BUSY: &str = "another command is already in progress";

/// At most one long-running command at a time.
#[derive(Debug, Clone, Default)]
pub struct CommandGuard {
    busy: Arc<AtomicBool>,
}

impl CommandGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` while another permit is alive.
    pub fn try_acquire(&self) -> Option<CommandPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CommandPermit {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the guard on drop.
#[derive(Debug)]
pub struct CommandPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for CommandPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct Router {
    session: Session,
    guard: CommandGuard,
}

impl Router {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            guard: CommandGuard::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!("Handling {}", request.action());
        match request {
            Request::CheckN8n => Response::Detection {
                is_n8n: self.session.detect().await,
            },
            Request::ExtractWorkflow => match self.session.extract().await {
                ExtractOutcome::Fresh(workflow) => Response::Workflow {
                    workflow,
                    cached: false,
                },
                ExtractOutcome::Cached(workflow) => Response::Workflow {
                    workflow,
                    cached: true,
                },
                ExtractOutcome::Failed(error) => Response::error(error),
            },
            Request::ApplyWorkflow { workflow } => {
                Response::Applied(self.apply_workflow(workflow).await)
            }
            Request::ApplyChanges {
                changes,
                original_workflow,
            } => Response::Applied(self.apply_changes(changes, original_workflow).await),
            Request::GetNodeTypes => match self.session.node_types().await {
                Ok(node_types) => Response::NodeTypes { node_types },
                Err(error) => Response::error(error),
            },
            Request::GetCredentials => match self.session.world().credentials().await {
                Ok(credentials) => Response::Credentials { credentials },
                Err(error) => Response::error(error),
            },
        }
    }

    async fn apply_workflow(&self, workflow: JsonPayload) -> ApplyResult {
        let Some(_permit) = self.guard.try_acquire() else {
            warn!("Rejecting applyWorkflow: {}", BUSY);
            return ApplyResult::failed(BUSY);
        };
        let workflow = match workflow.into_value() {
            Ok(workflow) => workflow,
            Err(e) => return ApplyResult::failed(format!("invalid workflow JSON: {}", e)),
        };
        self.session.world().apply_workflow(workflow).await
    }

    async fn apply_changes(
        &self,
        changes: JsonPayload,
        original: Option<JsonPayload>,
    ) -> ApplyResult {
        let Some(_permit) = self.guard.try_acquire() else {
            warn!("Rejecting applyChanges: {}", BUSY);
            return ApplyResult::failed(BUSY);
        };
        let changes = match parse_changes(changes) {
            Ok(changes) => changes,
            Err(e) => return ApplyResult::failed(format!("invalid changes format: {}", e)),
        };
        let original = match original.map(JsonPayload::into_value).transpose() {
            Ok(original) => original,
            Err(e) => return ApplyResult::failed(format!("invalid workflow JSON: {}", e)),
        };
        self.session.world().apply_changes(changes, original).await
    }
}

/// Accepts either a bare array or an object carrying a `changes` array.
/// Entries are read one by one, so a malformed entry fails on its own.
fn parse_changes(payload: JsonPayload) -> Result<Vec<ChangeOperation>, serde_json::Error> {
    let value = match payload.into_value()? {
        Value::Object(mut map) if map.contains_key("changes") => {
            map.remove("changes").unwrap_or(Value::Null)
        }
        other => other,
    };
    ChangeOperation::list_from_value(value)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
