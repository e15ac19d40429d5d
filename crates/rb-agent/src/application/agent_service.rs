//! AgentService: validates inbound envelopes, runs the pairing responder and
//! dispatches trusted input to an [`InputSink`].
//!
//! # Validation order
//!
//! Every text frame passes these checks, first failure wins:
//!
//! 1. JSON object (anything else is dropped without a reply)
//! 2. required fields present
//! 3. protocol version
//! 4. timestamp within the configured clock skew (when enabled)
//! 5. nonce not seen recently for this device
//! 6. id not seen recently for this device
//! 7. per-device rate limit
//!
//! Trusted devices get their own replay windows and rate budget.  Devices
//! that are not trusted yet share one of each, so a peer that invents a new
//! `device_id` for every frame gains neither memory nor throughput.
//!
//! Only then is the message type looked at.  Every rejection is answered
//! with `pair.result{success:false, reason}` from the host identity.
//!
//! # Pairing
//!
//! `pair.request` opens a pairing window and is answered with
//! `pair.challenge`.  The code itself never travels on the wire; the host
//! operator reads it from the agent log and types it on the device, which
//! sends it back in `pair.confirm`.  A matching confirmation inside the
//! window trusts the device and persists it through the [`TrustStore`].
//! Wrong codes are counted by the [`PairingGate`]; too many lock the device,
//! or the whole host, out of pairing for a while.

use std::time::Instant;

use rb_core::protocol::codec::now_ms;
use rb_core::protocol::messages::{
    PairChallenge, PairConfirm, PairRequest, PairResult, HOST_DEVICE_ID,
};
use rb_core::protocol::InvalidPairingCode;
use rb_core::{decode_envelope, encode_envelope, Envelope, MessageType, PairingCode, ProtocolError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::guard::{RateLimiter, ReplayWindow};
use crate::application::pairing::{Failure, Lockout, PairingGate, PairingLimits};
use crate::domain::{AgentConfig, HostCommand, TrustedDevice};

/// Rejection reasons carried in `pair.result.reason`.
pub mod reasons {
    pub const MISSING_FIELDS_PREFIX: &str = "missing_fields:";
    pub const UNSUPPORTED_PROTOCOL_VERSION: &str = "unsupported_protocol_version";
    pub const STALE_TIMESTAMP: &str = "stale_timestamp";
    pub const INVALID_OR_REPLAYED_NONCE: &str = "invalid_or_replayed_nonce";
    pub const REPLAYED_ID: &str = "replayed_id";
    pub const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
    pub const INVALID_PAIR_REQUEST: &str = "invalid_pair_request";
    pub const INVALID_CODE_OR_REJECTED: &str = "invalid_code_or_rejected";
    pub const DEVICE_NOT_TRUSTED: &str = "device_not_trusted";
    pub const MESSAGE_TYPE_NOT_ALLOWED: &str = "message_type_not_allowed";
    pub const INVALID_PAYLOAD: &str = "invalid_payload";
    pub const INPUT_REJECTED: &str = "input_rejected";
    pub const PAIRING_LOCKED_OUT: &str = "pairing_locked_out";
}

/// Guard key shared by every device that is not trusted yet.
const UNTRUSTED_GUARD_KEY: &str = "untrusted";

// ── Seams ─────────────────────────────────────────────────────────────────────

/// Errors from the trusted-device store.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error accessing registry at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("registry file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persistent set of devices the host operator approved.
#[cfg_attr(test, mockall::automock)]
pub trait TrustStore: Send + Sync {
    fn is_trusted(&self, device_id: &str) -> bool;

    /// Adds or replaces `device`.  The in-memory view is updated even when
    /// persisting fails.
    fn trust(&mut self, device: TrustedDevice) -> Result<(), RegistryError>;

    fn devices(&self) -> Vec<TrustedDevice>;
}

/// Why the host could not inject a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("unsupported key '{0}'")]
    UnsupportedKey(String),
    #[error("platform error: {0}")]
    Platform(String),
}

/// Injects decoded commands into the host OS.
#[cfg_attr(test, mockall::automock)]
pub trait InputSink: Send + Sync {
    fn apply(&self, command: &HostCommand) -> Result<(), SinkError>;
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// The two clocks the service consults: monotonic for rate limiting, epoch
/// milliseconds for envelope timestamps and pairing windows.
#[derive(Debug, Clone, Copy)]
pub struct Now {
    pub instant: Instant,
    pub epoch_ms: u64,
}

impl Now {
    pub fn system() -> Self {
        Self {
            instant: Instant::now(),
            epoch_ms: now_ms(),
        }
    }
}

// ── Service ───────────────────────────────────────────────────────────────────

struct PairingWindow {
    code: PairingCode,
    /// A configured code is reused for every attempt; a random one is
    /// replaced on each `pair.request` and consumed by a successful confirm.
    fixed: bool,
    opened_at_ms: Option<u64>,
}

/// The host agent's message handler.  One instance serves every connection.
pub struct AgentService {
    config: AgentConfig,
    pairing: PairingWindow,
    gate: PairingGate,
    nonces: ReplayWindow,
    ids: ReplayWindow,
    rate: RateLimiter,
    trust: Box<dyn TrustStore>,
    sink: Box<dyn InputSink>,
}

impl AgentService {
    /// Creates the service.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPairingCode`] if `config.pairing_code` is set
    /// but is not six digits.
    pub fn new(
        config: AgentConfig,
        trust: Box<dyn TrustStore>,
        sink: Box<dyn InputSink>,
    ) -> Result<Self, InvalidPairingCode> {
        let pairing = match &config.pairing_code {
            Some(code) => PairingWindow {
                code: PairingCode::parse(code)?,
                fixed: true,
                opened_at_ms: None,
            },
            None => PairingWindow {
                code: PairingCode::random(),
                fixed: false,
                opened_at_ms: None,
            },
        };
        // One extra slot for the shared untrusted key.
        let tracked = config.max_tracked_devices.saturating_add(1);
        Ok(Self {
            nonces: ReplayWindow::with_max_devices(config.replay_window, tracked),
            ids: ReplayWindow::with_max_devices(config.replay_window, tracked),
            rate: RateLimiter::with_max_devices(config.rate_limit_per_sec, tracked),
            gate: PairingGate::new(PairingLimits {
                request_ttl_ms: config.pairing_code_ttl_ms,
                max_pending: config.max_pending_pairings,
                max_attempts: config.max_pair_attempts,
                lockout_ms: config.pair_lockout_ms,
                max_failures_total: config.max_pair_failures_total,
            }),
            config,
            pairing,
            trust,
            sink,
        })
    }

    /// The code a `pair.confirm` must carry right now.
    pub fn pairing_code(&self) -> &PairingCode {
        &self.pairing.code
    }

    pub fn is_trusted(&self, device_id: &str) -> bool {
        self.trust.is_trusted(device_id)
    }

    /// Pairing requests currently remembered.
    pub fn pending_pairings(&self) -> usize {
        self.gate.pending_count()
    }

    /// Devices with their own replay window (plus the shared untrusted one).
    pub fn tracked_devices(&self) -> usize {
        self.nonces.device_count()
    }

    /// Handles one text frame and returns the encoded reply, if any.
    pub fn handle_frame(&mut self, text: &str) -> Option<String> {
        self.handle_frame_at(text, Now::system())
    }

    /// [`handle_frame`](Self::handle_frame) with an explicit clock.
    pub fn handle_frame_at(&mut self, text: &str, now: Now) -> Option<String> {
        let reply = self.process(text, now)?;
        match encode_envelope(&reply) {
            Ok(text) => Some(text),
            Err(e) => {
                error!("failed to encode reply: {e}");
                None
            }
        }
    }

    fn process(&mut self, text: &str, now: Now) -> Option<Envelope> {
        let envelope = match decode_envelope(text) {
            Ok(envelope) => envelope,
            Err(ProtocolError::Malformed(e)) => {
                debug!("ignoring malformed frame: {e}");
                return None;
            }
            Err(ProtocolError::MissingFields(fields)) => {
                warn!("rejecting frame with missing fields {fields:?}");
                return Some(reject(format!(
                    "{}{}",
                    reasons::MISSING_FIELDS_PREFIX,
                    fields.join(",")
                )));
            }
            Err(ProtocolError::UnsupportedVersion(version)) => {
                warn!("rejecting protocol version '{version}'");
                return Some(reject(reasons::UNSUPPORTED_PROTOCOL_VERSION));
            }
            Err(ProtocolError::InvalidField(e)) => {
                warn!("rejecting envelope with invalid field: {e}");
                return Some(reject(reasons::INVALID_PAYLOAD));
            }
        };

        if let Err(reason) = self.admit(&envelope, now) {
            warn!(device_id = %envelope.device_id, kind = %envelope.kind, "rejected: {reason}");
            return Some(reject(reason));
        }

        let reply = match MessageType::from_wire(&envelope.kind) {
            Some(MessageType::PairRequest) => self.on_pair_request(&envelope, now),
            Some(MessageType::PairConfirm) => self.on_pair_confirm(&envelope, now),
            Some(kind) if kind.is_gated() => self.on_input(kind, &envelope),
            _ => Err(reasons::MESSAGE_TYPE_NOT_ALLOWED),
        };
        Some(reply.unwrap_or_else(|reason| {
            debug!(device_id = %envelope.device_id, kind = %envelope.kind, "rejected: {reason}");
            reject(reason)
        }))
    }

    /// Freshness and rate checks, in order.
    fn admit(&mut self, envelope: &Envelope, now: Now) -> Result<(), &'static str> {
        let skew = self.config.max_clock_skew_ms;
        if skew > 0 && now.epoch_ms.abs_diff(envelope.ts) > skew {
            return Err(reasons::STALE_TIMESTAMP);
        }
        let key = if self.trust.is_trusted(&envelope.device_id) {
            envelope.device_id.as_str()
        } else {
            UNTRUSTED_GUARD_KEY
        };
        if !self.nonces.check_and_record(key, &envelope.nonce) {
            return Err(reasons::INVALID_OR_REPLAYED_NONCE);
        }
        if !self.ids.check_and_record(key, &envelope.id) {
            return Err(reasons::REPLAYED_ID);
        }
        if !self.rate.allow_at(key, now.instant) {
            return Err(reasons::RATE_LIMIT_EXCEEDED);
        }
        Ok(())
    }

    fn on_pair_request(&mut self, envelope: &Envelope, now: Now) -> Result<Envelope, &'static str> {
        let request: PairRequest = envelope
            .payload_as()
            .map_err(|_| reasons::INVALID_PAIR_REQUEST)?;
        if request.device_name.trim().is_empty() || request.public_key.trim().is_empty() {
            return Err(reasons::INVALID_PAIR_REQUEST);
        }
        if let Some(lockout) = self.gate.lockout(&envelope.device_id, now.epoch_ms) {
            audit_lockout(&envelope.device_id, lockout);
            return Err(reasons::PAIRING_LOCKED_OUT);
        }

        if !self.pairing.fixed {
            self.pairing.code = PairingCode::random();
        }
        self.pairing.opened_at_ms = Some(now.epoch_ms);
        info!(
            "pairing requested by '{}' ({}); code {} valid for {} s",
            request.device_name,
            envelope.device_id,
            self.pairing.code,
            self.config.pairing_code_ttl_ms / 1000
        );
        self.gate.open(&envelope.device_id, request, now.epoch_ms);

        reply(
            MessageType::PairChallenge,
            &PairChallenge {
                expires_in_ms: self.config.pairing_code_ttl_ms,
            },
        )
    }

    fn on_pair_confirm(&mut self, envelope: &Envelope, now: Now) -> Result<Envelope, &'static str> {
        let device_id = envelope.device_id.as_str();
        if let Some(lockout) = self.gate.lockout(device_id, now.epoch_ms) {
            audit_lockout(device_id, lockout);
            return Err(reasons::PAIRING_LOCKED_OUT);
        }
        let pending = self.gate.is_pending(device_id, now.epoch_ms);
        let verdict = self.check_confirmation(envelope, pending, now);
        if let Err(why) = verdict {
            info!(target: "audit", device_id, action = "pair_failed", "pairing failed: {why}");
            if pending {
                match self.gate.record_failure(device_id, now.epoch_ms) {
                    Failure::Retry { remaining } => {
                        debug!(device_id, "{remaining} pairing attempt(s) left");
                    }
                    Failure::DeviceLocked { until_ms } => {
                        audit_lockout(device_id, Lockout::Device { until_ms });
                    }
                    Failure::HostLocked { until_ms } => {
                        audit_lockout(device_id, Lockout::Host { until_ms });
                    }
                }
            }
            return Err(reasons::INVALID_CODE_OR_REJECTED);
        }

        let Some(request) = self.gate.take(device_id) else {
            return Err(reasons::INVALID_CODE_OR_REJECTED);
        };
        let device = TrustedDevice {
            device_id: device_id.to_owned(),
            device_name: request.device_name,
            public_key: request.public_key,
        };
        if let Err(e) = self.trust.trust(device) {
            error!("trusted {device_id} for this run only: {e}");
        }
        if !self.pairing.fixed {
            self.pairing.opened_at_ms = None;
        }

        let token = Uuid::new_v4().simple().to_string();
        info!(target: "audit", device_id, action = "pair_success", "device paired");
        reply(MessageType::PairResult, &PairResult::paired(token))
    }

    fn check_confirmation(
        &self,
        envelope: &Envelope,
        pending: bool,
        now: Now,
    ) -> Result<(), &'static str> {
        let confirm: PairConfirm = envelope.payload_as().map_err(|_| "malformed confirmation")?;
        if !pending {
            return Err("no pending pair.request");
        }
        if !confirm.accepted {
            return Err("declined on device");
        }
        let opened = self.pairing.opened_at_ms.ok_or("no pairing window open")?;
        if now.epoch_ms.saturating_sub(opened) > self.config.pairing_code_ttl_ms {
            return Err("code expired");
        }
        match PairingCode::parse(&confirm.code) {
            Ok(code) if code == self.pairing.code => Ok(()),
            _ => Err("code mismatch"),
        }
    }

    fn on_input(&mut self, kind: MessageType, envelope: &Envelope) -> Result<Envelope, &'static str> {
        let device_id = envelope.device_id.as_str();
        if !self.trust.is_trusted(device_id) {
            return Err(reasons::DEVICE_NOT_TRUSTED);
        }

        let command = match HostCommand::from_envelope(kind, envelope) {
            Ok(Some(command)) => command,
            Ok(None) => return Err(reasons::MESSAGE_TYPE_NOT_ALLOWED),
            Err(e) => {
                debug!("invalid {kind} payload: {e}");
                return Err(reasons::INVALID_PAYLOAD);
            }
        };

        if let Err(e) = self.sink.apply(&command) {
            warn!(device_id, "could not inject {command}: {e}");
            return Err(reasons::INPUT_REJECTED);
        }
        info!(target: "audit", device_id, action = kind.as_str(), "{command}");
        reply(MessageType::PairResult, &PairResult::ok())
    }
}

fn audit_lockout(device_id: &str, lockout: Lockout) {
    match lockout {
        Lockout::Device { until_ms } => warn!(
            target: "audit",
            device_id,
            action = "pair_locked_out",
            until_ms,
            "too many wrong pairing codes from this device"
        ),
        Lockout::Host { until_ms } => warn!(
            target: "audit",
            device_id,
            action = "pair_locked_out",
            until_ms,
            "too many wrong pairing codes; pairing closed for all devices"
        ),
    }
}

fn reply<P: Serialize>(kind: MessageType, payload: &P) -> Result<Envelope, &'static str> {
    Envelope::with_payload(kind, HOST_DEVICE_ID, payload).map_err(|e| {
        error!("failed to build {kind} reply: {e}");
        reasons::INVALID_PAYLOAD
    })
}

fn reject(reason: impl Into<String>) -> Envelope {
    let payload = serde_json::json!({
        "success": false,
        "session_token": null,
        "reason": reason.into(),
    });
    Envelope::now(MessageType::PairResult, HOST_DEVICE_ID, payload)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
