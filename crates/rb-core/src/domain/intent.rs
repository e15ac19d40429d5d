//! Input intents: the shared vocabulary between the gesture interpreter and
//! both output encoders.

use serde::{Deserialize, Serialize};

use crate::keymap::hid::{HidKeyCode, KeyStroke};

/// Mouse buttons the device can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Name used in `input.mouse_click` payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }

    /// Bit in the HID mouse report button bitmap (byte 0).
    pub fn hid_bit(self) -> u8 {
        match self {
            MouseButton::Left => 0x01,
            MouseButton::Right => 0x02,
            MouseButton::Middle => 0x04,
        }
    }
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete, transport-agnostic description of one user input action.
///
/// Intents are immutable once produced.  A `Click` or `KeyPress` carries the
/// whole press; the encoders expand it into a down/up pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIntent {
    /// Relative pointer motion in device units.
    Move { dx: i32, dy: i32 },
    /// Press and release of one button.
    Click { button: MouseButton },
    /// Wheel motion.  Positive `delta_y` scrolls content up.
    Scroll { delta_x: i32, delta_y: i32 },
    /// Press and release of one key, optionally with Shift held.
    KeyPress { key: HidKeyCode, shift: bool },
}

impl From<KeyStroke> for InputIntent {
    fn from(stroke: KeyStroke) -> Self {
        InputIntent::KeyPress {
            key: stroke.key,
            shift: stroke.shift,
        }
    }
}

/// Lazily maps `text` to one `KeyPress` per supported character.
///
/// Unsupported characters are skipped without an error.
pub fn intents_for_text(text: &str) -> impl Iterator<Item = InputIntent> + '_ {
    text.chars()
        .filter_map(KeyStroke::from_char)
        .map(InputIntent::from)
}
