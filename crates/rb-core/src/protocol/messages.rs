//! Message types and payload shapes carried inside a session [`Envelope`].
//!
//! Every message is a JSON object (the envelope) whose `type` field is a
//! dotted string and whose `payload` object shape depends on that type:
//!
//! ```json
//! {"protocol_version":"1.0","type":"input.mouse_move","id":"…","ts":1700000000000,
//!  "nonce":"…","device_id":"…","payload":{"dx":4,"dy":-2}}
//! ```
//!
//! # Namespaces
//!
//! | Prefix    | Direction       | Allowed before pairing? |
//! |-----------|-----------------|-------------------------|
//! | `pair.`   | both            | yes                     |
//! | `input.`  | device → host   | no                      |
//! | `system.` | device → host   | no                      |
//!
//! [`Envelope`]: crate::protocol::codec::Envelope

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::intent::MouseButton;

/// Protocol version placed in every envelope.
pub const PROTOCOL_VERSION: &str = "1.0";

/// How long the host keeps a pairing code valid after a `pair.request`.
pub const PAIRING_CODE_TTL_MS: u64 = 60_000;

/// Sender id the host agent uses for its replies.
pub const HOST_DEVICE_ID: &str = "windows-host";

/// Namespaces that require a paired session.
const GATED_PREFIXES: [&str; 2] = ["input.", "system."];

/// Returns `true` if a message of type `kind` may only be sent while paired.
pub fn is_gated(kind: &str) -> bool {
    GATED_PREFIXES.iter().any(|prefix| kind.starts_with(prefix))
}

// ── Message types ─────────────────────────────────────────────────────────────

/// Every message type understood by both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    PairRequest,
    PairChallenge,
    PairConfirm,
    PairResult,
    MouseMove,
    MouseClick,
    MouseScroll,
    KeyPress,
    SystemMedia,
}

impl MessageType {
    pub const ALL: [MessageType; 9] = [
        MessageType::PairRequest,
        MessageType::PairChallenge,
        MessageType::PairConfirm,
        MessageType::PairResult,
        MessageType::MouseMove,
        MessageType::MouseClick,
        MessageType::MouseScroll,
        MessageType::KeyPress,
        MessageType::SystemMedia,
    ];

    /// Wire name placed in the envelope `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::PairRequest => "pair.request",
            MessageType::PairChallenge => "pair.challenge",
            MessageType::PairConfirm => "pair.confirm",
            MessageType::PairResult => "pair.result",
            MessageType::MouseMove => "input.mouse_move",
            MessageType::MouseClick => "input.mouse_click",
            MessageType::MouseScroll => "input.mouse_scroll",
            MessageType::KeyPress => "input.keypress",
            MessageType::SystemMedia => "system.media",
        }
    }

    /// Parses a wire name; unknown names return `None`.
    pub fn from_wire(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == kind)
    }

    /// Returns `true` for `input.*` and `system.*` types.
    pub fn is_gated(self) -> bool {
        is_gated(self.as_str())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Pairing payloads ──────────────────────────────────────────────────────────

/// `pair.request`: the device introduces itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRequest {
    pub device_name: String,
    pub public_key: String,
}

/// `pair.challenge`: the host has displayed a code out-of-band.
///
/// The code itself never travels to the device; the user reads it off the
/// host screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairChallenge {
    pub expires_in_ms: u64,
}

/// `pair.confirm`: the code the user typed plus their explicit approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfirm {
    pub code: String,
    pub accepted: bool,
}

/// `pair.result`: outcome of pairing, and the host's acknowledgement or
/// rejection of every later message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    pub success: bool,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PairResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            session_token: None,
            reason: None,
        }
    }

    pub fn paired(session_token: impl Into<String>) -> Self {
        Self {
            success: true,
            session_token: Some(session_token.into()),
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            session_token: None,
            reason: Some(reason.into()),
        }
    }
}

// ── Input payloads ────────────────────────────────────────────────────────────

/// Press phase of a button or key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressAction {
    Down,
    Up,
}

/// `input.mouse_move`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseMove {
    pub dx: i32,
    pub dy: i32,
}

/// `input.mouse_click`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseClick {
    pub button: MouseButton,
    pub action: PressAction,
}

/// `input.mouse_scroll`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseScroll {
    pub delta_x: i32,
    pub delta_y: i32,
}

/// `input.keypress`.  `key` is a lowercase key name such as `"a"`, `"7"`,
/// `"space"`, `"enter"` or `"shift"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    pub key: String,
    pub action: PressAction,
}

/// Key name used to wrap shifted key presses.
pub const SHIFT_KEY: &str = "shift";

// ── System payloads ───────────────────────────────────────────────────────────

/// Media keys the host can press on the device's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCommand {
    PlayPause,
    Next,
    Prev,
    VolUp,
    VolDown,
    Mute,
}

impl MediaCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCommand::PlayPause => "play_pause",
            MediaCommand::Next => "next",
            MediaCommand::Prev => "prev",
            MediaCommand::VolUp => "vol_up",
            MediaCommand::VolDown => "vol_down",
            MediaCommand::Mute => "mute",
        }
    }
}

impl FromStr for MediaCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play_pause" => Ok(MediaCommand::PlayPause),
            "next" => Ok(MediaCommand::Next),
            "prev" => Ok(MediaCommand::Prev),
            "vol_up" => Ok(MediaCommand::VolUp),
            "vol_down" => Ok(MediaCommand::VolDown),
            "mute" => Ok(MediaCommand::Mute),
            other => Err(format!("unknown media command: {other}")),
        }
    }
}

/// `system.media`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMedia {
    pub command: MediaCommand,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_message_type_round_trips_through_its_wire_name() {
        for kind in MessageType::ALL {
            assert_eq!(MessageType::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageType::from_wire("input.teleport"), None);
    }

    #[test]
    fn test_only_input_and_system_types_are_gated() {
        let gated: Vec<_> = MessageType::ALL.into_iter().filter(|t| t.is_gated()).collect();
        assert_eq!(
            gated,
            vec![
                MessageType::MouseMove,
                MessageType::MouseClick,
                MessageType::MouseScroll,
                MessageType::KeyPress,
                MessageType::SystemMedia,
            ]
        );
        assert!(is_gated("system.reboot"), "unknown gated namespace types are gated too");
        assert!(!is_gated("pair.whatever"));
    }

    #[test]
    fn test_pair_result_serializes_null_optionals() {
        let json = serde_json::to_value(PairResult::ok()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "session_token": null, "reason": null})
        );
    }

    #[test]
    fn test_pair_result_tolerates_missing_optionals() {
        let result: PairResult = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(result, PairResult { success: false, session_token: None, reason: None });
    }

    #[test]
    fn test_click_payload_uses_lowercase_names() {
        let json = serde_json::to_value(MouseClick {
            button: MouseButton::Left,
            action: PressAction::Down,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"button": "left", "action": "down"}));
    }

    #[test]
    fn test_media_command_parses_and_serializes_snake_case() {
        for name in ["play_pause", "next", "prev", "vol_up", "vol_down", "mute"] {
            let command: MediaCommand = name.parse().unwrap();
            assert_eq!(command.as_str(), name);
            assert_eq!(serde_json::to_value(command).unwrap(), serde_json::json!(name));
        }
        assert!("louder".parse::<MediaCommand>().is_err());
    }
}
