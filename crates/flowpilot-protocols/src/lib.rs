//! # Flowpilot Protocols
//!
//! Shared type and trait definitions for the Flowpilot workspace.
//! Contains only data types and interface definitions - no page logic.
//!
//! ## Core Types
//!
//! - [`WorkflowGraph`] - The node/connection document extracted from and applied to the editor
//! - [`ChangeOperation`] - A discrete edit applied against a live editor instance
//! - [`Request`] / [`Response`] - Messages crossing the router boundary
//!
//! ## Core Traits
//!
//! - [`PageDom`] - Read-only DOM access from the isolated side
//! - [`PageWorld`] - Object-handle access inside the host page's own script context
//! - [`ChatProvider`] - Chat-completion capability consumed by the assistant
//! - [`KeyValueStore`] - Key-value persistence capability
//! - [`WorkflowNotifier`] - Receiver of workflow update notifications

pub mod error;
pub mod message;
pub mod notify;
pub mod page;
pub mod provider;
pub mod workflow;

pub use error::{PageError, ProviderError, StoreError};
pub use message::{ApplyResult, CredentialSummary, JsonPayload, Request, Response};
pub use notify::{KeyValueStore, WorkflowNotifier, WorkflowUpdate};
pub use page::{
    AddedElement, ElementSnapshot, MutationBatch, MutationKind, MutationRecord, MutationStream,
    ObjectRef, PageDom, PageWorld,
};
pub use provider::{ChatProvider, ChatRole, ChatTurn};
pub use workflow::{
    ChangeKind, ChangeOperation, ConnectionGroup, ConnectionTarget, Node, WorkflowGraph,
};
