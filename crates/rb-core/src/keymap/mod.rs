//! Key code table for keyboard input.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Characters are mapped to a key plus a shift flag at the typing boundary.

pub mod hid;

pub use hid::{HidKeyCode, KeyStroke};
