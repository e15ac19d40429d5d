//! Host commands decoded from gated envelopes.
//!
//! Only `input.*` and `system.*` envelopes become commands; pairing messages
//! are handled by the agent service itself.

use std::fmt;

use rb_core::protocol::messages::{
    KeyPress, MediaCommand, MessageType, MouseClick, MouseMove, MouseScroll, PressAction,
    SystemMedia,
};
use rb_core::{Envelope, MouseButton, ProtocolError};

/// One input action for the host to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Relative pointer motion in pixels.
    MouseMove { dx: i32, dy: i32 },
    MouseButton { button: MouseButton, action: PressAction },
    MouseScroll { delta_x: i32, delta_y: i32 },
    /// `key` is the device's key name, e.g. `"a"`, `"enter"`, `"shift"`.
    Key { key: String, action: PressAction },
    Media(MediaCommand),
}

impl HostCommand {
    /// Decodes the payload of a gated envelope.
    ///
    /// Returns `Ok(None)` for message types that do not carry input.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] if the payload does not have
    /// the shape `kind` requires.
    pub fn from_envelope(
        kind: MessageType,
        envelope: &Envelope,
    ) -> Result<Option<Self>, ProtocolError> {
        let command = match kind {
            MessageType::MouseMove => {
                let MouseMove { dx, dy } = envelope.payload_as()?;
                HostCommand::MouseMove { dx, dy }
            }
            MessageType::MouseClick => {
                let MouseClick { button, action } = envelope.payload_as()?;
                HostCommand::MouseButton { button, action }
            }
            MessageType::MouseScroll => {
                let MouseScroll { delta_x, delta_y } = envelope.payload_as()?;
                HostCommand::MouseScroll { delta_x, delta_y }
            }
            MessageType::KeyPress => {
                let KeyPress { key, action } = envelope.payload_as()?;
                if key.trim().is_empty() {
                    return Err(ProtocolError::InvalidField("key must not be empty".to_owned()));
                }
                HostCommand::Key { key, action }
            }
            MessageType::SystemMedia => {
                let SystemMedia { command } = envelope.payload_as()?;
                HostCommand::Media(command)
            }
            MessageType::PairRequest
            | MessageType::PairChallenge
            | MessageType::PairConfirm
            | MessageType::PairResult => return Ok(None),
        };
        Ok(Some(command))
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let press = |a: &PressAction| match a {
            PressAction::Down => "down",
            PressAction::Up => "up",
        };
        match self {
            HostCommand::MouseMove { dx, dy } => write!(f, "move {dx},{dy}"),
            HostCommand::MouseButton { button, action } => {
                write!(f, "{button} button {}", press(action))
            }
            HostCommand::MouseScroll { delta_x, delta_y } => {
                write!(f, "scroll {delta_x},{delta_y}")
            }
            HostCommand::Key { key, action } => write!(f, "key {key} {}", press(action)),
            HostCommand::Media(command) => write!(f, "media {}", command.as_str()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(kind: MessageType, payload: serde_json::Value) -> Envelope {
        Envelope::new(kind, "dev-1", payload, 1)
    }

    #[test]
    fn test_mouse_click_decodes_button_and_action() {
        // Arrange
        let env = envelope(
            MessageType::MouseClick,
            json!({"button": "right", "action": "down"}),
        );

        // Act
        let cmd = HostCommand::from_envelope(MessageType::MouseClick, &env).unwrap();

        // Assert
        assert_eq!(
            cmd,
            Some(HostCommand::MouseButton {
                button: MouseButton::Right,
                action: PressAction::Down
            })
        );
    }

    #[test]
    fn test_media_command_decodes() {
        let env = envelope(MessageType::SystemMedia, json!({"command": "vol_down"}));

        let cmd = HostCommand::from_envelope(MessageType::SystemMedia, &env).unwrap();

        assert_eq!(cmd, Some(HostCommand::Media(MediaCommand::VolDown)));
    }

    #[test]
    fn test_wrong_payload_shape_is_invalid_field() {
        let env = envelope(MessageType::MouseMove, json!({"dx": "left"}));

        let result = HostCommand::from_envelope(MessageType::MouseMove, &env);

        assert!(matches!(result, Err(ProtocolError::InvalidField(_))));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let env = envelope(MessageType::KeyPress, json!({"key": " ", "action": "up"}));

        let result = HostCommand::from_envelope(MessageType::KeyPress, &env);

        assert!(matches!(result, Err(ProtocolError::InvalidField(_))));
    }

    #[test]
    fn test_pairing_types_are_not_commands() {
        let env = envelope(MessageType::PairConfirm, json!({"code": "123456", "accepted": true}));

        assert_eq!(
            HostCommand::from_envelope(MessageType::PairConfirm, &env),
            Ok(None)
        );
    }

    #[test]
    fn test_display_is_compact() {
        let cmd = HostCommand::Key {
            key: "enter".into(),
            action: PressAction::Down,
        };
        assert_eq!(cmd.to_string(), "key enter down");
    }
}
