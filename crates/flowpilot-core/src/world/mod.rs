//! The host-page side of the boundary.
//!
//! [`PageAgent`] owns the [`PageWorld`] handle and answers [`WorldRequest`]s.
//! Everything else talks to it through a [`WorldClient`], whose calls are
//! each bounded by the matching timeout in [`BridgeConfig`].

mod catalog;

use std::sync::Arc;
use std::time::Duration;

use flowpilot_config::BridgeConfig;
use flowpilot_protocols::{
    ApplyResult, ChangeOperation, CredentialSummary, ObjectRef, PageError, PageWorld,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bridge::{Bridge, BridgeEndpoint};
use crate::detection;
use crate::dispatcher::Dispatcher;
use crate::error::BridgeError;
use crate::extraction::{globals, host_api};
use crate::locator::{HostProfile, Locator};

pub use catalog::{credentials, node_types};

/// Work executed inside the host page's script context.
#[derive(Debug, Clone)]
pub enum WorldRequest {
    /// Whether any well-known host global is defined.
    ProbeGlobals,
    /// Look the current workflow up in page globals and storage.
    ReadGlobals,
    /// Fetch the current workflow through the host's REST or JS API.
    ReadHostApi,
    NodeTypes,
    Credentials,
    ApplyWorkflow {
        workflow: Value,
    },
    ApplyChanges {
        changes: Vec<ChangeOperation>,
        original: Option<Value>,
    },
}

#[derive(Debug, Clone)]
pub enum WorldResponse {
    Present(bool),
    Workflow(Option<Value>),
    NodeTypes(Result<Vec<String>, String>),
    Credentials(Result<Vec<CredentialSummary>, String>),
    Applied(ApplyResult),
}

/// Serves world requests against one page.
pub struct PageAgent {
    page: Arc<dyn PageWorld>,
    locator: Locator,
    dispatcher: Dispatcher,
}

impl PageAgent {
    pub fn new(page: Arc<dyn PageWorld>, profile: HostProfile) -> Self {
        Self {
            page,
            locator: Locator::new(profile.clone()),
            dispatcher: Dispatcher::new(profile),
        }
    }

    /// Serve until every caller is gone. Each request runs on its own task,
    /// so one that never finishes does not hold up the rest.
    ///
    /// Object handles are released whenever the last in-flight request
    /// finishes. Requests hold a read lock while they run, so a release
    /// never lands in the middle of one.
    pub fn spawn(self, mut endpoint: BridgeEndpoint<WorldRequest, WorldResponse>) -> JoinHandle<()> {
        let agent = Arc::new(self);
        let in_flight = Arc::new(RwLock::new(()));
        tokio::spawn(async move {
            while let Some(envelope) = endpoint.requests.recv().await {
                let agent = agent.clone();
                let in_flight = in_flight.clone();
                let responder = endpoint.responder.clone();
                tokio::spawn(async move {
                    let response = {
                        let _serving = in_flight.read().await;
                        agent.serve(envelope.request).await
                    };
                    responder.respond(envelope.call_id, response);
                    if let Ok(_idle) = in_flight.try_write() {
                        agent.release().await;
                    }
                });
            }
            debug!("Page agent stopped");
        })
    }

    async fn release(&self) {
        if let Err(e) = self.page.release().await {
            warn!("Failed to release page handles: {}", e);
        }
    }

    pub async fn serve(&self, request: WorldRequest) -> WorldResponse {
        let page = self.page.as_ref();
        match request {
            WorldRequest::ProbeGlobals => {
                WorldResponse::Present(detection::host_globals_present(page).await)
            }
            WorldRequest::ReadGlobals => WorldResponse::Workflow(globals::lookup(page).await),
            WorldRequest::ReadHostApi => WorldResponse::Workflow(host_api::lookup(page).await),
            WorldRequest::NodeTypes => WorldResponse::NodeTypes(node_types(page).await),
            WorldRequest::Credentials => WorldResponse::Credentials(credentials(page).await),
            WorldRequest::ApplyWorkflow { workflow } => {
                WorldResponse::Applied(self.apply_workflow(&workflow).await)
            }
            WorldRequest::ApplyChanges { changes, original } => {
                WorldResponse::Applied(self.apply_changes(&changes, original.as_ref()).await)
            }
        }
    }

    async fn apply_workflow(&self, workflow: &Value) -> ApplyResult {
        if !crate::validator::is_valid_workflow(workflow) {
            return ApplyResult::failed("invalid workflow format");
        }
        match self.locator.locate(self.page.as_ref()).await {
            Some(handle) => {
                self.dispatcher
                    .apply_workflow(self.page.as_ref(), &handle, workflow)
                    .await
            }
            None => ApplyResult::failed("could not find the host instance"),
        }
    }

    async fn apply_changes(
        &self,
        changes: &[ChangeOperation],
        original: Option<&Value>,
    ) -> ApplyResult {
        match self.locator.locate(self.page.as_ref()).await {
            Some(handle) => {
                self.dispatcher
                    .apply_changes(self.page.as_ref(), &handle, changes, original)
                    .await
            }
            None => ApplyResult::failed("could not find the host instance"),
        }
    }
}

/// Follow `path` member by member starting at `from`.
pub(crate) async fn walk(
    page: &dyn PageWorld,
    from: &ObjectRef,
    path: &[&str],
) -> Result<Option<ObjectRef>, PageError> {
    let mut current = from.clone();
    for key in path {
        match page.property(&current, key).await? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// `window.a.b.c` for `["a", "b", "c"]`.
pub(crate) async fn global_path(
    page: &dyn PageWorld,
    path: &[&str],
) -> Result<Option<ObjectRef>, PageError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(None);
    };
    match page.global(first).await? {
        Some(root) => walk(page, &root, rest).await,
        None => Ok(None),
    }
}

/// Caller side of the page boundary.
#[derive(Clone)]
pub struct WorldClient {
    bridge: Bridge<WorldRequest, WorldResponse>,
    timeouts: BridgeConfig,
}

impl WorldClient {
    /// Start a [`PageAgent`] for `page` and return a client connected to it.
    /// The agent stops once every clone of the client is dropped.
    pub fn start(page: Arc<dyn PageWorld>, profile: HostProfile, timeouts: BridgeConfig) -> Self {
        let (bridge, endpoint) = Bridge::channel();
        PageAgent::new(page, profile).spawn(endpoint);
        Self { bridge, timeouts }
    }

    /// A client over an existing bridge, for callers that serve it themselves.
    pub fn from_bridge(bridge: Bridge<WorldRequest, WorldResponse>, timeouts: BridgeConfig) -> Self {
        Self { bridge, timeouts }
    }

    async fn call(
        &self,
        request: WorldRequest,
        timeout: Duration,
    ) -> Result<WorldResponse, BridgeError> {
        self.bridge.call(request, timeout).await
    }

    pub async fn has_host_globals(&self) -> bool {
        match self
            .call(WorldRequest::ProbeGlobals, self.timeouts.globals_timeout())
            .await
        {
            Ok(WorldResponse::Present(present)) => present,
            Ok(_) => false,
            Err(e) => {
                debug!("Global probe failed: {}", e);
                false
            }
        }
    }

    pub async fn read_globals(&self) -> Option<Value> {
        self.read_workflow(WorldRequest::ReadGlobals, self.timeouts.globals_timeout())
            .await
    }

    pub async fn read_host_api(&self) -> Option<Value> {
        self.read_workflow(WorldRequest::ReadHostApi, self.timeouts.api_timeout())
            .await
    }

    async fn read_workflow(&self, request: WorldRequest, timeout: Duration) -> Option<Value> {
        match self.call(request, timeout).await {
            Ok(WorldResponse::Workflow(workflow)) => workflow,
            Ok(_) => None,
            Err(e) => {
                warn!("Workflow read across the page boundary failed: {}", e);
                None
            }
        }
    }

    pub async fn node_types(&self) -> Result<Vec<String>, String> {
        match self
            .call(WorldRequest::NodeTypes, self.timeouts.catalog_timeout())
            .await
        {
            Ok(WorldResponse::NodeTypes(result)) => result,
            Ok(_) => Err("unexpected response".to_string()),
            Err(BridgeError::Timeout(_)) => Err("timed out fetching node types".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    pub async fn credentials(&self) -> Result<Vec<CredentialSummary>, String> {
        match self
            .call(WorldRequest::Credentials, self.timeouts.catalog_timeout())
            .await
        {
            Ok(WorldResponse::Credentials(result)) => result,
            Ok(_) => Err("unexpected response".to_string()),
            Err(BridgeError::Timeout(_)) => Err("timed out fetching credentials".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    pub async fn apply_workflow(&self, workflow: Value) -> ApplyResult {
        self.apply(
            WorldRequest::ApplyWorkflow { workflow },
            "timed out applying the workflow",
        )
        .await
    }

    pub async fn apply_changes(
        &self,
        changes: Vec<ChangeOperation>,
        original: Option<Value>,
    ) -> ApplyResult {
        self.apply(
            WorldRequest::ApplyChanges { changes, original },
            "timed out applying changes",
        )
        .await
    }

    async fn apply(&self, request: WorldRequest, timeout_message: &str) -> ApplyResult {
        match self.call(request, self.timeouts.dispatch_timeout()).await {
            Ok(WorldResponse::Applied(result)) => result,
            Ok(_) => ApplyResult::failed("unexpected response"),
            Err(BridgeError::Timeout(_)) => {
                warn!("{}", timeout_message);
                ApplyResult::failed(timeout_message)
            }
            Err(e) => ApplyResult::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod tests;
