//! Session protocol engine: the device side of pairing and input forwarding.
//!
//! # Pairing handshake (for beginners)
//!
//! The host agent will not act on input from a device it does not know.  The
//! device earns trust once, with a code the user reads off the host screen:
//!
//! ```text
//!  Device                                   Host agent
//!    │── pair.request {device_name, public_key} ──►│  shows 6-digit code
//!    │◄──────────── pair.challenge {expires_in_ms} ─│
//!    │── pair.confirm {code, accepted:true} ───────►│  compares code
//!    │◄──────── pair.result {success, session_token} │
//! ```
//!
//! Until a successful `pair.result` arrives the engine refuses to build any
//! `input.*` or `system.*` envelope, so nothing unauthenticated ever reaches
//! the socket.  A transport disconnect drops the engine back to
//! [`SessionState::Unpaired`].

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::intent::InputIntent;
use crate::protocol::codec::{decode_envelope, Envelope, ProtocolError};
use crate::protocol::messages::{
    KeyPress, MediaCommand, MessageType, MouseClick, MouseMove, MouseScroll, PairChallenge,
    PairConfirm, PairRequest, PairResult, PressAction, SystemMedia, SHIFT_KEY,
};
use crate::protocol::pairing::{InvalidPairingCode, PairingCode};

/// Reason the host sends when it no longer trusts this device.
pub const REASON_DEVICE_NOT_TRUSTED: &str = "device_not_trusted";

/// Errors returned when building outbound envelopes.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// An `input.*` or `system.*` message was requested while unpaired.
    #[error("pair first")]
    NotPaired,

    #[error(transparent)]
    InvalidCode(#[from] InvalidPairingCode),

    #[error("could not encode payload: {0}")]
    Payload(#[from] ProtocolError),
}

/// Pairing state of the current connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unpaired,
    /// A `pair.confirm` was sent; waiting for the host's verdict.
    AwaitingResult,
    Paired { session_token: Option<String> },
}

/// Something the user interface should know about after an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The host is showing a code valid for `expires_in_ms`.
    Challenge { expires_in_ms: u64 },
    /// Pairing succeeded.
    Paired { session_token: Option<String> },
    /// Pairing was refused; the session stays unpaired.
    PairingFailed { reason: String },
    /// The host revoked trust; the session is unpaired again.
    Unpaired { reason: String },
    /// The host accepted a forwarded message.
    Acknowledged,
    /// The host refused a forwarded message without revoking trust.
    Rejected { reason: String },
}

/// Device-side state machine for one connection.
#[derive(Debug)]
pub struct SessionEngine {
    device_id: String,
    state: SessionState,
}

impl SessionEngine {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            state: SessionState::Unpaired,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_paired(&self) -> bool {
        matches!(self.state, SessionState::Paired { .. })
    }

    // ── Pairing ───────────────────────────────────────────────────────────────

    /// Builds a `pair.request`.
    pub fn pair_request(
        &mut self,
        device_name: &str,
        public_key: &str,
    ) -> Result<Envelope, SessionError> {
        self.build(
            MessageType::PairRequest,
            &PairRequest {
                device_name: device_name.to_owned(),
                public_key: public_key.to_owned(),
            },
        )
    }

    /// Builds a `pair.confirm` and starts waiting for the host's verdict.
    pub fn pair_confirm(&mut self, code: &PairingCode) -> Result<Envelope, SessionError> {
        let envelope = self.build(
            MessageType::PairConfirm,
            &PairConfirm {
                code: code.as_str().to_owned(),
                accepted: true,
            },
        )?;
        self.state = SessionState::AwaitingResult;
        Ok(envelope)
    }

    /// Validates `code` and, only if it is well formed, returns the
    /// `pair.request` and `pair.confirm` envelopes to send in that order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidCode`] without building anything when
    /// `code` is not exactly six digits.
    pub fn begin_pairing(
        &mut self,
        device_name: &str,
        public_key: &str,
        code: &str,
    ) -> Result<[Envelope; 2], SessionError> {
        let code = PairingCode::parse(code)?;
        let request = self.pair_request(device_name, public_key)?;
        let confirm = self.pair_confirm(&code)?;
        Ok([request, confirm])
    }

    // ── Outbound ──────────────────────────────────────────────────────────────

    /// Wraps `payload` in a fresh envelope of type `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotPaired`] for gated types while unpaired.
    pub fn build<P: Serialize>(
        &self,
        kind: MessageType,
        payload: &P,
    ) -> Result<Envelope, SessionError> {
        if kind.is_gated() && !self.is_paired() {
            debug!(%kind, "refusing to build gated message while unpaired");
            return Err(SessionError::NotPaired);
        }
        Ok(Envelope::with_payload(kind, self.device_id.as_str(), payload)?)
    }

    /// Translates one intent into the envelopes that express it.
    ///
    /// Clicks and key presses become down/up pairs; a shifted key is wrapped
    /// in a `shift` down/up pair.
    pub fn encode_intent(&self, intent: &InputIntent) -> Result<Vec<Envelope>, SessionError> {
        if !self.is_paired() {
            return Err(SessionError::NotPaired);
        }

        match *intent {
            InputIntent::Move { dx, dy } => {
                Ok(vec![self.build(MessageType::MouseMove, &MouseMove { dx, dy })?])
            }
            InputIntent::Click { button } => [PressAction::Down, PressAction::Up]
                .into_iter()
                .map(|action| self.build(MessageType::MouseClick, &MouseClick { button, action }))
                .collect(),
            InputIntent::Scroll { delta_x, delta_y } => Ok(vec![self.build(
                MessageType::MouseScroll,
                &MouseScroll { delta_x, delta_y },
            )?]),
            InputIntent::KeyPress { key, shift } => {
                let name = key.key_name();
                let mut presses = Vec::with_capacity(4);
                if shift {
                    presses.push((SHIFT_KEY, PressAction::Down));
                }
                presses.push((name, PressAction::Down));
                presses.push((name, PressAction::Up));
                if shift {
                    presses.push((SHIFT_KEY, PressAction::Up));
                }
                presses
                    .into_iter()
                    .map(|(key, action)| {
                        self.build(
                            MessageType::KeyPress,
                            &KeyPress {
                                key: key.to_owned(),
                                action,
                            },
                        )
                    })
                    .collect()
            }
        }
    }

    /// Builds a `system.media` command.
    pub fn media(&self, command: MediaCommand) -> Result<Envelope, SessionError> {
        self.build(MessageType::SystemMedia, &SystemMedia { command })
    }

    // ── Inbound ───────────────────────────────────────────────────────────────

    /// Applies one inbound text frame.
    ///
    /// Malformed frames and types the device does not consume are ignored.
    pub fn handle_inbound(&mut self, text: &str) -> Option<SessionEvent> {
        let envelope = match decode_envelope(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("ignoring inbound frame: {e}");
                return None;
            }
        };

        match envelope.message_type() {
            Some(MessageType::PairChallenge) => match envelope.payload_as::<PairChallenge>() {
                Ok(challenge) => Some(SessionEvent::Challenge {
                    expires_in_ms: challenge.expires_in_ms,
                }),
                Err(e) => {
                    debug!("ignoring pair.challenge: {e}");
                    None
                }
            },
            Some(MessageType::PairResult) => match envelope.payload_as::<PairResult>() {
                Ok(result) => self.apply_result(result),
                Err(e) => {
                    debug!("ignoring pair.result: {e}");
                    None
                }
            },
            _ => {
                debug!(kind = %envelope.kind, "ignoring inbound message type");
                None
            }
        }
    }

    /// Forgets pairing after the transport closed.
    pub fn on_disconnect(&mut self) {
        if self.state != SessionState::Unpaired {
            info!("transport closed; session unpaired");
        }
        self.state = SessionState::Unpaired;
    }

    fn apply_result(&mut self, result: PairResult) -> Option<SessionEvent> {
        let reason = result.reason.unwrap_or_default();
        match (self.state.clone(), result.success) {
            // Input acks carry no token; one still in flight when pairing
            // restarted is not the verdict.
            (SessionState::AwaitingResult, true) if result.session_token.is_none() => {
                debug!("ignoring token-less pair.result while awaiting the verdict");
                None
            }
            (SessionState::AwaitingResult, true) => {
                info!("pairing succeeded");
                self.state = SessionState::Paired {
                    session_token: result.session_token.clone(),
                };
                Some(SessionEvent::Paired {
                    session_token: result.session_token,
                })
            }
            (SessionState::AwaitingResult, false) => {
                warn!(%reason, "pairing failed");
                self.state = SessionState::Unpaired;
                Some(SessionEvent::PairingFailed { reason })
            }
            (SessionState::Paired { .. }, true) => Some(SessionEvent::Acknowledged),
            (SessionState::Paired { .. }, false) if reason == REASON_DEVICE_NOT_TRUSTED => {
                warn!("host no longer trusts this device");
                self.state = SessionState::Unpaired;
                Some(SessionEvent::Unpaired { reason })
            }
            (SessionState::Paired { .. }, false) => Some(SessionEvent::Rejected { reason }),
            (SessionState::Unpaired, true) => {
                debug!("ignoring unsolicited successful pair.result");
                None
            }
            (SessionState::Unpaired, false) => Some(SessionEvent::Rejected { reason }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
