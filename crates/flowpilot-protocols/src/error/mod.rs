//! Error types for the Flowpilot protocol layer.

mod page;
mod provider;
mod store;

pub use page::*;
pub use provider::*;
pub use store::*;
