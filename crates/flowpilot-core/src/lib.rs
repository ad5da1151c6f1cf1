//! # Flowpilot Core
//!
//! Workflow extraction and mutation against a live editor page.
//!
//! ## Components
//!
//! - [`is_valid_workflow`] - the schema gate every candidate passes through
//! - [`StrategyChain`] - ordered extraction heuristics, first valid hit wins
//! - [`is_significant`] - change reconciliation between two snapshots
//! - [`Locator`] - finds the host application's live instance
//! - [`Dispatcher`] - applies a workflow or change list through the first
//!   mutation pathway the instance supports
//! - [`Bridge`] and [`PageAgent`] - typed calls into the host page's
//!   script context with bounded waits
//! - [`Session`] - per-page detection, observation and retry scheduling
//! - [`Router`] - request/response entry point for collaborators

pub mod assistant;
pub mod bridge;
pub mod detection;
pub mod dispatcher;
pub mod error;
pub mod extraction;
pub mod locator;
pub mod notify;
pub mod reconcile;
pub mod router;
pub mod session;
pub mod validator;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use assistant::{
    AnalysisFocus, Assistant, ChangeProposal, GeneratedWorkflow, changes_from_response,
    workflow_from_response,
};
pub use bridge::{Bridge, BridgeEndpoint, Envelope, Responder};
pub use detection::{DetectionReport, Detector};
pub use dispatcher::{Dispatcher, Pathway};
pub use error::BridgeError;
pub use extraction::{ExtractionStrategy, StrategyChain};
pub use locator::{HostHandle, HostProfile, Locator};
pub use notify::{ChannelNotifier, LogNotifier, MemoryStore, PersistingNotifier};
pub use reconcile::is_significant;
pub use router::{CommandGuard, CommandPermit, Router};
pub use session::{ExtractOutcome, Phase, Session, SessionBuilder};
pub use validator::is_valid_workflow;
pub use world::{PageAgent, WorldClient, WorldRequest, WorldResponse};
