//! RemoteSessionUseCase: pairs with the host agent and forwards intents as
//! session envelopes.
//!
//! The [`SessionEngine`] decides what may be sent; this use case owns the
//! ordering discipline.  The engine lock is held while a batch of envelopes
//! is written so the down/up halves of one intent are never interleaved with
//! another caller's envelopes.

use std::sync::Arc;

use async_trait::async_trait;
use rb_core::protocol::messages::MediaCommand;
use rb_core::protocol::pairing::PairingCode;
use rb_core::{
    encode_envelope, intents_for_text, Envelope, InputIntent, ProtocolError, SessionEngine,
    SessionError, SessionEvent, SessionState,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors reported by a [`MessageChannel`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("message channel is not open")]
    NotOpen,
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Ordered, bidirectional text transport to the host agent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageChannel: Send + Sync {
    fn is_open(&self) -> bool;

    async fn send_text(&self, text: String) -> Result<(), ChannelError>;
}

/// Error type for the remote session use case.
#[derive(Debug, Error, PartialEq)]
pub enum RemoteError {
    /// Input was refused locally because the session is not paired, or the
    /// pairing code was malformed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The channel is closed or refused the frame; the rest was dropped.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(ChannelError),

    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

impl From<ChannelError> for RemoteError {
    fn from(e: ChannelError) -> Self {
        RemoteError::TransportUnavailable(e)
    }
}

/// Identity the device presents in `pair.request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub device_name: String,
    pub public_key: String,
}

/// The remote session use case.
pub struct RemoteSessionUseCase {
    channel: Arc<dyn MessageChannel>,
    identity: DeviceIdentity,
    engine: Mutex<SessionEngine>,
}

impl RemoteSessionUseCase {
    pub fn new(channel: Arc<dyn MessageChannel>, identity: DeviceIdentity) -> Self {
        let engine = SessionEngine::new(identity.device_id.clone());
        Self {
            channel,
            identity,
            engine: Mutex::new(engine),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.engine.lock().await.state().clone()
    }

    pub async fn is_paired(&self) -> bool {
        self.engine.lock().await.is_paired()
    }

    /// Sends `pair.request` followed by `pair.confirm` with `code`.
    ///
    /// # Errors
    ///
    /// A malformed code is rejected before anything touches the channel.
    /// Returns [`RemoteError::TransportUnavailable`] if the channel is closed.
    pub async fn pair(&self, code: &str) -> Result<(), RemoteError> {
        let code = PairingCode::parse(code).map_err(SessionError::from)?;
        self.ensure_open()?;

        let mut engine = self.engine.lock().await;
        let request =
            engine.pair_request(&self.identity.device_name, &self.identity.public_key)?;
        self.write(&request).await?;
        let confirm = engine.pair_confirm(&code)?;
        self.write(&confirm).await?;
        info!("pairing requested as {}", self.identity.device_name);
        Ok(())
    }

    /// Forwards one intent.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotPaired`] while unpaired (nothing is sent), or
    /// [`RemoteError::TransportUnavailable`] when a frame cannot be written.
    pub async fn send_intent(&self, intent: &InputIntent) -> Result<(), RemoteError> {
        let engine = self.engine.lock().await;
        let envelopes = engine.encode_intent(intent)?;
        self.ensure_open()?;
        for envelope in &envelopes {
            self.write(envelope).await?;
        }
        debug!("forwarded {intent:?} as {} envelope(s)", envelopes.len());
        Ok(())
    }

    /// Types `text` as a series of key presses.
    pub async fn send_text(&self, text: &str) -> Result<(), RemoteError> {
        for intent in intents_for_text(text) {
            self.send_intent(&intent).await?;
        }
        Ok(())
    }

    /// Sends a `system.media` command.
    pub async fn send_media(&self, command: MediaCommand) -> Result<(), RemoteError> {
        let engine = self.engine.lock().await;
        let envelope = engine.media(command)?;
        self.ensure_open()?;
        self.write(&envelope).await
    }

    /// Applies one inbound frame from the host.
    pub async fn handle_inbound(&self, text: &str) -> Option<SessionEvent> {
        self.engine.lock().await.handle_inbound(text)
    }

    /// Resets pairing after the transport closed.
    pub async fn on_disconnect(&self) {
        self.engine.lock().await.on_disconnect();
    }

    fn ensure_open(&self) -> Result<(), RemoteError> {
        if self.channel.is_open() {
            Ok(())
        } else {
            Err(RemoteError::TransportUnavailable(ChannelError::NotOpen))
        }
    }

    async fn write(&self, envelope: &Envelope) -> Result<(), RemoteError> {
        let text = encode_envelope(envelope)?;
        self.channel.send_text(text).await?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
