//! Network infrastructure for the device application.
//!
//! Maintains the WebSocket connection to the host agent and forwards inbound
//! text frames to the application layer.
//!
//! Architecture:
//! - `WsClientConnection` owns the write half (sink) of the socket.
//! - Inbound text frames are forwarded on an `mpsc` channel as
//!   [`NetworkEvent::TextReceived`].
//! - Outbound frames go through the [`MessageChannel`] implementation, which
//!   serialises writers on the sink mutex so frames leave in call order.
//!
//! The connection never parses envelopes itself; that is the session
//! engine's job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::application::remote_session::{ChannelError, MessageChannel};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// Default agent endpoint.
pub const DEFAULT_AGENT_URL: &str = "ws://127.0.0.1:8765";

/// Configuration for the device's WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Agent endpoint, e.g. `ws://192.168.1.20:8765`.
    pub url: String,
    /// Delay between connection attempts after a failure or disconnect.
    pub reconnect_interval: Duration,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_AGENT_URL.to_string(),
            reconnect_interval: Duration::from_secs(5),
        }
    }
}

/// Events emitted by the network layer to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The WebSocket handshake with the agent completed.
    Connected { url: String },
    /// The connection was lost.  Pairing must be repeated after reconnect.
    Disconnected,
    /// A text frame arrived from the agent.
    TextReceived(String),
}

/// Manages the WebSocket connection from the device to the host agent.
pub struct WsClientConnection {
    config: WsClientConfig,
    sink: Arc<Mutex<Option<WsSink>>>,
    open: AtomicBool,
}

impl WsClientConnection {
    /// Creates a new (not yet connected) `WsClientConnection`.
    pub fn new(config: WsClientConfig) -> Self {
        Self {
            config,
            sink: Arc::new(Mutex::new(None)),
            open: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connects to the agent and begins reading frames.
    ///
    /// Returns a channel receiver that delivers [`NetworkEvent`]s to the caller.
    /// Runs a continuous reconnect loop until `running` is set to false.
    pub async fn start(self: Arc<Self>, running: Arc<AtomicBool>) -> mpsc::Receiver<NetworkEvent> {
        let (tx, rx) = mpsc::channel(128);
        let this = Arc::clone(&self);

        tokio::spawn(async move {
            while running.load(Ordering::Relaxed) {
                match connect_async(this.config.url.as_str()).await {
                    Ok((ws_stream, _response)) => {
                        info!("connected to agent at {}", this.config.url);
                        let (ws_tx, ws_rx) = ws_stream.split();
                        {
                            let mut guard = this.sink.lock().await;
                            *guard = Some(ws_tx);
                        }
                        this.open.store(true, Ordering::Relaxed);

                        let url = this.config.url.clone();
                        if tx.send(NetworkEvent::Connected { url }).await.is_err() {
                            break;
                        }

                        this.read_loop(ws_rx, &tx, &running).await;

                        this.open.store(false, Ordering::Relaxed);
                        {
                            let mut guard = this.sink.lock().await;
                            *guard = None;
                        }
                        if tx.send(NetworkEvent::Disconnected).await.is_err() {
                            break;
                        }
                        info!(
                            "disconnected from agent; reconnecting in {:?}",
                            this.config.reconnect_interval
                        );
                    }
                    Err(e) => {
                        warn!("could not connect to agent at {}: {e}", this.config.url);
                    }
                }

                if running.load(Ordering::Relaxed) {
                    time::sleep(this.config.reconnect_interval).await;
                }
            }
        });

        rx
    }

    /// Reads frames until the socket closes or `running` is cleared.
    async fn read_loop<S>(&self, mut ws_rx: S, tx: &mpsc::Sender<NetworkEvent>, running: &AtomicBool)
    where
        S: futures_util::Stream<Item = Result<WsMessage, WsError>> + Unpin,
    {
        while running.load(Ordering::Relaxed) {
            let msg = match time::timeout(Duration::from_millis(200), ws_rx.next()).await {
                Err(_) => continue,
                Ok(None) => break,
                Ok(Some(Err(WsError::ConnectionClosed | WsError::Protocol(_)))) => break,
                Ok(Some(Err(e))) => {
                    error!("WebSocket read error: {e}");
                    break;
                }
                Ok(Some(Ok(msg))) => msg,
            };

            match msg {
                WsMessage::Text(text) => {
                    if tx.send(NetworkEvent::TextReceived(text)).await.is_err() {
                        break;
                    }
                }
                WsMessage::Ping(data) => {
                    let mut guard = self.sink.lock().await;
                    if let Some(sink) = guard.as_mut() {
                        let _ = sink.send(WsMessage::Pong(data)).await;
                    }
                }
                WsMessage::Close(_) => break,
                WsMessage::Binary(_) => {
                    debug!("ignoring binary frame from agent");
                }
                WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            }
        }
    }
}

#[async_trait]
impl MessageChannel for WsClientConnection {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    async fn send_text(&self, text: String) -> Result<(), ChannelError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ChannelError::NotOpen)?;
        sink.send(WsMessage::Text(text))
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
