//! Live editor page access for Flowpilot over the Chrome DevTools Protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │    Flowpilot    │ ◄──────────────► │   Chrome/Edge    │
//! │   (CdpPage)     │       CDP        │  (editor tab)    │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! ## Setup
//!
//! Start Chrome with remote debugging enabled and open the workflow editor:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```
//!
//! DOM reads go through `Runtime.evaluate` with results returned by value.
//! Host objects are kept as remote object ids, grouped so they can be
//! released together through `PageWorld::release`.

mod client;
mod error;
mod page;
mod protocol;
mod scripts;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use page::CdpPage;
pub use protocol::*;
pub use session::PageSession;
