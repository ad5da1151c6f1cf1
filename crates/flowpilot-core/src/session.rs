//! Per-page session: detection, observation and extraction scheduling.
//!
//! A [`Session`] owns everything that would otherwise be page-global: the
//! last known good workflow, the attempt counter, rate-limit and page-load
//! instants, the retry timer and the node type cache. All of it is dropped
//! with the session, and dropping the last handle cancels the retry timer.

use std::sync::{Arc, Weak};

use flowpilot_config::{DetectionConfig, ExtractionConfig};
use flowpilot_protocols::{
    MutationBatch, MutationKind, PageDom, WorkflowNotifier, WorkflowUpdate,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::detection::Detector;
use crate::extraction::StrategyChain;
use crate::reconcile::is_significant;
use crate::world::WorldClient;

const RELEVANT_CLASSES: &[&str] = &["n8n-workflow", "node-item", "connection", "connections-container"];
const RELEVANT_ATTRIBUTES: &[&str] = &["data-workflow", "data-nodes", "data-connections"];

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Detecting,
    Observing,
}

/// Result of a router-driven extraction. Workflows are JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Fresh(String),
    /// The last known good workflow, returned in place of a new attempt.
    Cached(String),
    Failed(String),
}

struct State {
    phase: Phase,
    last_workflow: Option<String>,
    attempts: u32,
    last_extraction: Option<Instant>,
    retry: Option<CancellationToken>,
    node_types: Vec<String>,
}

struct Inner {
    world: WorldClient,
    dom: Arc<dyn PageDom>,
    chain: StrategyChain,
    detector: Detector,
    notifier: Arc<dyn WorkflowNotifier>,
    detection: DetectionConfig,
    extraction: ExtractionConfig,
    page_loaded: Instant,
    shutdown: CancellationToken,
    state: Mutex<State>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// A successful attempt: the new workflow and the snapshot it replaced.
struct Fresh {
    workflow: String,
    previous: Option<String>,
}

/// Cheap to clone; every clone drives the same page.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

/// Configures a [`Session`] before it starts.
pub struct SessionBuilder {
    dom: Arc<dyn PageDom>,
    world: WorldClient,
    notifier: Arc<dyn WorkflowNotifier>,
    chain: Option<StrategyChain>,
    detection: DetectionConfig,
    extraction: ExtractionConfig,
}

impl SessionBuilder {
    /// Replace the standard extraction chain.
    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_config(mut self, detection: DetectionConfig, extraction: ExtractionConfig) -> Self {
        self.detection = detection;
        self.extraction = extraction;
        self
    }

    pub fn build(self) -> Session {
        let chain = self
            .chain
            .unwrap_or_else(|| StrategyChain::standard(self.dom.clone(), self.world.clone()));
        Session {
            inner: Arc::new(Inner {
                detector: Detector::new(self.dom.clone(), self.world.clone()),
                world: self.world,
                dom: self.dom,
                chain,
                notifier: self.notifier,
                detection: self.detection,
                extraction: self.extraction,
                page_loaded: Instant::now(),
                shutdown: CancellationToken::new(),
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    last_workflow: None,
                    attempts: 0,
                    last_extraction: None,
                    retry: None,
                    node_types: Vec::new(),
                }),
            }),
        }
    }
}

impl Session {
    /// A session with the standard chain and default timings.
    pub fn new(
        dom: Arc<dyn PageDom>,
        world: WorldClient,
        notifier: Arc<dyn WorkflowNotifier>,
    ) -> Self {
        Self::builder(dom, world, notifier).build()
    }

    pub fn builder(
        dom: Arc<dyn PageDom>,
        world: WorldClient,
        notifier: Arc<dyn WorkflowNotifier>,
    ) -> SessionBuilder {
        SessionBuilder {
            dom,
            world,
            notifier,
            chain: None,
            detection: DetectionConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }

    pub fn world(&self) -> &WorldClient {
        &self.inner.world
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    pub fn last_workflow(&self) -> Option<String> {
        self.inner.state.lock().last_workflow.clone()
    }

    /// Failed attempts since the last success.
    pub fn attempts(&self) -> u32 {
        self.inner.state.lock().attempts
    }

    /// Whether the retry timer is armed.
    pub fn retry_pending(&self) -> bool {
        self.inner.state.lock().retry.is_some()
    }

    fn set_phase(&self, phase: Phase) {
        let mut state = self.inner.state.lock();
        if state.phase != phase {
            debug!("Session phase {:?} -> {:?}", state.phase, phase);
            state.phase = phase;
        }
    }

    /// Run every detection signal once.
    pub async fn detect(&self) -> bool {
        let report = self.inner.detector.detect().await;
        let detected = report.detected();
        if detected {
            info!("Workflow editor detected");
        }
        detected
    }

    /// Extract on request. Calls closer together than the minimum interval
    /// get the cached workflow, when there is one, without running the chain.
    /// A failed attempt falls back to the cached workflow and arms the retry
    /// timer.
    pub async fn extract(&self) -> ExtractOutcome {
        let now = Instant::now();
        {
            let mut state = self.inner.state.lock();
            let recent = state.last_extraction.is_some_and(|last| {
                now.duration_since(last) < self.inner.extraction.min_interval()
            });
            if recent {
                if let Some(workflow) = &state.last_workflow {
                    debug!("Extraction rate limited, returning cached workflow");
                    return ExtractOutcome::Cached(workflow.clone());
                }
            }
            state.last_extraction = Some(now);
        }

        if let Some(fresh) = self.attempt().await {
            return ExtractOutcome::Fresh(fresh.workflow);
        }

        self.arm_retry();
        match self.last_workflow() {
            Some(workflow) => ExtractOutcome::Cached(workflow),
            None => ExtractOutcome::Failed(
                "could not extract the workflow with any strategy".to_string(),
            ),
        }
    }

    /// One pass over the chain. Success replaces the snapshot, resets the
    /// attempt counter and disarms the retry timer.
    async fn attempt(&self) -> Option<Fresh> {
        let found = self.inner.chain.run().await;
        let text = found.and_then(|workflow| match serde_json::to_string(&workflow) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Extracted workflow could not be serialized: {}", e);
                None
            }
        });

        let mut state = self.inner.state.lock();
        match text {
            Some(workflow) => {
                let previous = state.last_workflow.replace(workflow.clone());
                state.attempts = 0;
                if let Some(retry) = state.retry.take() {
                    retry.cancel();
                }
                Some(Fresh { workflow, previous })
            }
            None => {
                state.attempts += 1;
                debug!("Extraction attempt {} failed", state.attempts);
                None
            }
        }
    }

    /// Attempt, and on success tell the notifier whether the change matters.
    async fn extract_and_notify(&self) -> bool {
        let Some(fresh) = self.attempt().await else {
            self.arm_retry();
            return false;
        };
        let significant = match &fresh.previous {
            Some(previous) => significant_change(previous, &fresh.workflow),
            None => true,
        };
        self.inner
            .notifier
            .workflow_updated(WorkflowUpdate {
                workflow: fresh.workflow,
                significant,
            })
            .await;
        true
    }

    fn within_caps(&self) -> bool {
        let attempts = self.inner.state.lock().attempts;
        attempts < self.inner.extraction.max_attempts
            && self.inner.page_loaded.elapsed() < self.inner.extraction.max_elapsed()
    }

    fn disarm_retry(&self) {
        if let Some(retry) = self.inner.state.lock().retry.take() {
            retry.cancel();
        }
    }

    /// Start the retry timer unless it is running or a cap was reached.
    fn arm_retry(&self) {
        if !self.within_caps() {
            return;
        }
        let token = {
            let mut state = self.inner.state.lock();
            if state.retry.is_some() {
                return;
            }
            let token = self.inner.shutdown.child_token();
            state.retry = Some(token.clone());
            token
        };

        let interval = self.inner.extraction.retry_interval();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        debug!("Retrying extraction every {:?}", interval);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let session = Session { inner };
                if session.extract_and_notify().await {
                    return;
                }
                if !session.within_caps() {
                    info!("Giving up on extraction retries after {} attempts", session.attempts());
                    session.disarm_retry();
                    return;
                }
            }
        });
    }

    /// Node types known to the editor, fetched once and cached.
    pub async fn node_types(&self) -> Result<Vec<String>, String> {
        {
            let state = self.inner.state.lock();
            if !state.node_types.is_empty() {
                return Ok(state.node_types.clone());
            }
        }
        let types = self.inner.world.node_types().await?;
        if !types.is_empty() {
            self.inner.state.lock().node_types = types.clone();
        }
        Ok(types)
    }

    /// Detect, then observe until shut down. Returns early when detection
    /// gives up or the page stops reporting mutations.
    pub async fn run(&self) {
        let shutdown = self.inner.shutdown.clone();
        tokio::select! {
            _ = shutdown.cancelled() => debug!("Session shut down"),
            _ = self.drive() => {}
        }
    }

    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.disarm_retry();
    }

    async fn drive(&self) {
        if self.wait_for_editor().await {
            self.observe().await;
        }
        self.set_phase(Phase::Idle);
    }

    async fn wait_for_editor(&self) -> bool {
        self.set_phase(Phase::Detecting);
        let deadline = Instant::now() + self.inner.detection.timeout();
        loop {
            if self.detect().await {
                return true;
            }
            if Instant::now() >= deadline {
                info!("No workflow editor detected, giving up");
                return false;
            }
            tokio::time::sleep(self.inner.detection.interval()).await;
        }
    }

    async fn observe(&self) {
        let mut batches = match self.inner.dom.watch_mutations().await {
            Ok(batches) => batches,
            Err(e) => {
                warn!("Could not watch page mutations: {}", e);
                return;
            }
        };
        self.set_phase(Phase::Observing);

        if let Err(e) = self.node_types().await {
            debug!("Node types unavailable: {}", e);
        }

        tokio::time::sleep(self.inner.extraction.initial_delay()).await;
        self.extract_and_notify().await;

        let debounce = self.inner.extraction.debounce();
        let mut deadline: Option<Instant> = None;
        loop {
            tokio::select! {
                batch = batches.recv() => match batch {
                    Some(batch) => {
                        if is_relevant(&batch) {
                            deadline = Some(Instant::now() + debounce);
                        }
                    }
                    None => {
                        debug!("Mutation stream closed");
                        return;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    debug!("Workflow change observed, extracting");
                    self.extract_and_notify().await;
                }
            }
        }
    }
}

fn significant_change(previous: &str, current: &str) -> bool {
    match (
        serde_json::from_str::<Value>(previous),
        serde_json::from_str::<Value>(current),
    ) {
        (Ok(old), Ok(new)) => is_significant(&old, &new),
        _ => true,
    }
}

/// Whether a mutation batch can affect the workflow.
pub(crate) fn is_relevant(batch: &MutationBatch) -> bool {
    batch.iter().any(|record| match record.kind {
        MutationKind::ChildList => record.added.iter().any(|element| {
            element
                .classes
                .iter()
                .any(|c| RELEVANT_CLASSES.contains(&c.as_str()))
                || element.attributes.iter().any(|a| a == "data-workflow")
                || element.has_workflow_descendant
        }),
        MutationKind::Attributes => match record.attribute_name.as_deref() {
            Some("class") => record.target_classes.iter().any(|c| c == "node-item"),
            Some(name) => RELEVANT_ATTRIBUTES.contains(&name),
            None => false,
        },
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
