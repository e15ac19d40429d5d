//! WebSocket server: accept loop and per-connection tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each accepted connection to a WebSocket session.
//! 3. Passing every text frame to the shared [`AgentService`] and writing
//!    its reply back on the same connection.
//! 4. Stopping the accept loop when the `running` flag is cleared.
//!
//! # Shared state
//!
//! All connections share one `AgentService` behind a `tokio::sync::Mutex`,
//! so replay windows, rate limits and the pairing window are global to the
//! host.  Frames from one connection are handled strictly in arrival order.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::AgentService;

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the accept loop until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (e.g., the port is
/// already in use).
pub async fn run_server(
    bind_addr: SocketAddr,
    service: Arc<Mutex<AgentService>>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;
    info!("agent listening on ws://{}", listener.local_addr().unwrap_or(bind_addr));

    serve(listener, service, running).await;
    Ok(())
}

/// Accepts connections on an already-bound listener.
///
/// Split from [`run_server`] so tests can bind port 0 and learn the address.
pub async fn serve(
    listener: TcpListener,
    service: Arc<Mutex<AgentService>>,
    running: Arc<AtomicBool>,
) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the flag is re-checked even without new devices.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new device connection from {peer_addr}");
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    handle_device_session(stream, peer_addr, service).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_device_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    service: Arc<Mutex<AgentService>>,
) {
    match run_session(raw_stream, peer_addr, service).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    service: Arc<Mutex<AgentService>>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;
    debug!("WebSocket session established: {peer_addr}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        let msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {peer_addr}: WebSocket closed");
                break;
            }
            Some(Err(e)) => {
                return Err(e).with_context(|| format!("session {peer_addr}: read failed"));
            }
            None => break,
        };

        match msg {
            WsMessage::Text(text) => {
                let reply = service.lock().await.handle_frame(&text);
                if let Some(reply) = reply {
                    ws_tx
                        .send(WsMessage::Text(reply))
                        .await
                        .with_context(|| format!("session {peer_addr}: send failed"))?;
                }
            }
            WsMessage::Binary(_) => {
                warn!("session {peer_addr}: unexpected binary frame (ignored)");
            }
            WsMessage::Ping(data) => {
                ws_tx.send(WsMessage::Pong(data)).await.ok();
            }
            WsMessage::Close(_) => break,
            WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AgentConfig;
    use crate::infrastructure::{InMemoryTrustStore, LoggingInputSink};

    fn service() -> Arc<Mutex<AgentService>> {
        let svc = AgentService::new(
            AgentConfig::default(),
            Box::new(InMemoryTrustStore::new()),
            Box::new(LoggingInputSink),
        )
        .unwrap();
        Arc::new(Mutex::new(svc))
    }

    #[tokio::test]
    async fn test_run_server_fails_on_port_in_use() {
        // Arrange: hold the port
        let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = holder.local_addr().unwrap();

        // Act
        let result = run_server(addr, service(), Arc::new(AtomicBool::new(true))).await;

        // Assert
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_serve_returns_when_not_running() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        tokio::time::timeout(
            Duration::from_secs(2),
            serve(listener, service(), Arc::new(AtomicBool::new(false))),
        )
        .await
        .expect("serve should stop immediately");
    }
}
