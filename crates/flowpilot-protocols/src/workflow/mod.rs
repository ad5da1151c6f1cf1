//! Workflow document and change types.

mod change;
mod graph;

pub use change::{ChangeKind, ChangeOperation};
pub use graph::{ConnectionGroup, ConnectionTarget, Node, WorkflowGraph};
