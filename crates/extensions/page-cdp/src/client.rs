//! Browser connection: endpoint discovery and a multiplexed WebSocket
//! transport shared by every attached page.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::CdpError;
use crate::protocol::{Command, Frame, Incoming, RemoteFailure, TargetInfo, VersionInfo};
use crate::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Reply = Result<Value, RemoteFailure>;

/// Upper bound for a single CDP command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Hands incoming frames to whoever waits for them: replies to their
/// caller by id, events to the page session they belong to.
#[derive(Clone, Default)]
pub(crate) struct Demux {
    replies: Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>,
    subscribers: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Incoming>>>>,
}

impl Demux {
    fn expect(&self, id: u64) -> oneshot::Receiver<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().insert(id, tx);
        rx
    }

    fn forget(&self, id: u64) {
        self.replies.lock().remove(&id);
    }

    fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<Incoming> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(session_id.to_string(), tx);
        rx
    }

    fn route(&self, frame: Frame) {
        match frame {
            Frame::Reply { id, outcome } => match self.replies.lock().remove(&id) {
                Some(tx) => {
                    let _ = tx.send(outcome);
                }
                None => debug!("Reply {} arrived after its caller gave up", id),
            },
            Frame::Event { session_id, event } => {
                let key = session_id.unwrap_or_default();
                let mut subscribers = self.subscribers.lock();
                let delivered = subscribers.get(&key).map(|tx| tx.send(event).is_ok());
                if delivered == Some(false) {
                    subscribers.remove(&key);
                }
            }
            Frame::Unknown => trace!("Ignoring frame without id or method"),
        }
    }

    /// Fail every waiting caller and end every event stream.
    fn close(&self) {
        self.replies.lock().clear();
        self.subscribers.lock().clear();
    }
}

/// Sending half of the connection plus its demultiplexer.
#[derive(Clone)]
pub(crate) struct Transport {
    sink: Arc<tokio::sync::Mutex<WsSink>>,
    next_id: Arc<AtomicU64>,
    demux: Demux,
}

impl Transport {
    async fn open(ws_url: &str) -> Result<(Self, JoinHandle<()>), CdpError> {
        let (stream, _) = tokio_tungstenite::connect_async(ws_url).await?;
        let (sink, source) = stream.split();
        let transport = Self {
            sink: Arc::new(tokio::sync::Mutex::new(sink)),
            next_id: Arc::new(AtomicU64::new(1)),
            demux: Demux::default(),
        };
        let reader = tokio::spawn(read_frames(source, transport.demux.clone()));
        Ok((transport, reader))
    }

    pub(crate) fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<Incoming> {
        self.demux.subscribe(session_id)
    }

    /// Send one command and wait for its reply.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = serde_json::to_string(&Command {
            id,
            method,
            params,
            session_id,
        })?;
        trace!("-> {}", text);

        let reply = self.demux.expect(id);
        let sent = self.sink.lock().await.send(Message::Text(text.into())).await;
        if let Err(e) = sent {
            self.demux.forget(id);
            return Err(e.into());
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, reply).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(failure))) => Err(CdpError::remote(method, failure)),
            Ok(Err(_)) => Err(CdpError::Closed),
            Err(_) => {
                self.demux.forget(id);
                Err(CdpError::Timeout(method.to_string()))
            }
        }
    }
}

async fn read_frames(mut source: WsSource, demux: Demux) {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                trace!("<- {}", text);
                match serde_json::from_str::<Incoming>(&text) {
                    Ok(incoming) => demux.route(incoming.classify()),
                    Err(e) => warn!("Unreadable CDP frame: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Browser closed the connection");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            Ok(_) => {}
        }
    }
    demux.close();
}

/// GET a discovery document from the browser's HTTP endpoint.
async fn discover<T: DeserializeOwned>(endpoint: &str, path: &str) -> Result<T, CdpError> {
    let url = format!("{}/{}", endpoint, path);
    debug!("GET {}", url);
    let response = reqwest::get(&url)
        .await
        .map_err(|e| CdpError::BrowserUnreachable {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
    Ok(response.json().await?)
}

/// One browser, reached over its remote debugging endpoint.
pub struct CdpClient {
    endpoint: String,
    version: VersionInfo,
    transport: Transport,
    reader: JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser at `endpoint` (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        Url::parse(&endpoint)?;

        let version: VersionInfo = discover(&endpoint, "json/version").await?;
        info!(
            "Connected to {} (protocol {})",
            version.browser, version.protocol_version
        );
        let (transport, reader) = Transport::open(&version.web_socket_debugger_url).await?;

        Ok(Self {
            endpoint,
            version,
            transport,
            reader,
        })
    }

    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    /// Browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    pub async fn targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        discover(&self.endpoint, "json/list").await
    }

    /// First page whose URL contains `url_part`, or the first page at all.
    pub async fn find_page(&self, url_part: Option<&str>) -> Result<TargetInfo, CdpError> {
        self.targets()
            .await?
            .into_iter()
            .filter(|target| target.kind == "page")
            .find(|target| url_part.is_none_or(|part| target.url.contains(part)))
            .ok_or_else(|| CdpError::NoTarget(url_part.unwrap_or("any page").to_string()))
    }

    /// Attach a flattened session to a page target.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
            )
            .await?;
        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::Unexpected("attachToTarget without sessionId".to_string()))?
            .to_string();

        let events = self.transport.subscribe(&session_id);
        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.transport.clone(),
            events,
        );
        session.enable_domains().await?;
        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
