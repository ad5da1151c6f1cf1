//! Typed request/response channel across the page boundary.
//!
//! The caller side ([`Bridge`]) numbers every call and parks a one-shot
//! listener under that number. The serving side receives [`Envelope`]s and
//! answers through a [`Responder`]. The listener is removed when the call
//! finishes for any reason, so an answer that arrives after a timeout finds
//! nobody waiting and is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::error::BridgeError;

type Listeners<Resp> = Arc<Mutex<HashMap<u64, oneshot::Sender<Resp>>>>;

/// A request tagged with its call id.
#[derive(Debug)]
pub struct Envelope<Req> {
    pub call_id: u64,
    pub request: Req,
}

/// Caller side of the channel.
pub struct Bridge<Req, Resp> {
    next_id: Arc<AtomicU64>,
    listeners: Listeners<Resp>,
    outbound: mpsc::UnboundedSender<Envelope<Req>>,
}

impl<Req, Resp> Clone for Bridge<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            next_id: self.next_id.clone(),
            listeners: self.listeners.clone(),
            outbound: self.outbound.clone(),
        }
    }
}

/// Serving side of the channel.
pub struct BridgeEndpoint<Req, Resp> {
    pub requests: mpsc::UnboundedReceiver<Envelope<Req>>,
    pub responder: Responder<Resp>,
}

/// Delivers answers to whoever is still listening.
pub struct Responder<Resp> {
    listeners: Listeners<Resp>,
}

impl<Resp> Clone for Responder<Resp> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<Resp> Responder<Resp> {
    /// Answer call `call_id`. Returns `false` when no listener is left.
    pub fn respond(&self, call_id: u64, response: Resp) -> bool {
        let listener = self.listeners.lock().remove(&call_id);
        match listener {
            Some(tx) => tx.send(response).is_ok(),
            None => {
                trace!("Dropping late response for call {}", call_id);
                false
            }
        }
    }
}

/// Removes a call's listener when the call scope ends.
struct ListenerGuard<Resp> {
    call_id: u64,
    listeners: Listeners<Resp>,
}

impl<Resp> Drop for ListenerGuard<Resp> {
    fn drop(&mut self) {
        self.listeners.lock().remove(&self.call_id);
    }
}

impl<Req, Resp> Bridge<Req, Resp> {
    /// Create a connected caller/server pair.
    pub fn channel() -> (Self, BridgeEndpoint<Req, Resp>) {
        let (outbound, requests) = mpsc::unbounded_channel();
        let listeners: Listeners<Resp> = Arc::new(Mutex::new(HashMap::new()));
        let bridge = Self {
            next_id: Arc::new(AtomicU64::new(1)),
            listeners: listeners.clone(),
            outbound,
        };
        let endpoint = BridgeEndpoint {
            requests,
            responder: Responder { listeners },
        };
        (bridge, endpoint)
    }

    /// Send `request` and wait at most `timeout` for its answer.
    pub async fn call(&self, request: Req, timeout: Duration) -> Result<Resp, BridgeError> {
        let call_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.listeners.lock().insert(call_id, tx);
        let _guard = ListenerGuard {
            call_id,
            listeners: self.listeners.clone(),
        };

        self.outbound
            .send(Envelope { call_id, request })
            .map_err(|_| BridgeError::Closed)?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => {
                debug!("Call {} timed out after {:?}", call_id, timeout);
                Err(BridgeError::Timeout(timeout))
            }
        }
    }

    /// Number of calls still waiting for an answer.
    pub fn pending_calls(&self) -> usize {
        self.listeners.lock().len()
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
