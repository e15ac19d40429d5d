//! # rb-core
//!
//! Shared library for RemoteBrain containing the gesture interpreter, the
//! input intent vocabulary, the HID report encoder and the pairing/session
//! protocol engine.
//!
//! This crate is used by both the handheld device and the host agent.
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! RemoteBrain turns a handheld touch screen into a remote touchpad and
//! keyboard for a host computer.  Input reaches the host over one of two
//! transports: raw Bluetooth HID reports that the host OS consumes as if from
//! a physical mouse/keyboard, or JSON envelopes sent over a WebSocket to an
//! agent running on the host.
//!
//! This crate (`rb-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The [`InputIntent`] vocabulary and the
//!   [`GestureInterpreter`] state machine that turns raw touch samples into
//!   intents (moves, taps, two-finger scrolls).
//!
//! - **`keymap`** – The USB HID usage IDs for the characters the device can
//!   type.
//!
//! - **`hid`** – A pure encoder from intents to fixed-layout HID reports plus
//!   the report descriptor those reports conform to.
//!
//! - **`protocol`** – The JSON envelope, its payloads, and the
//!   [`SessionEngine`] that drives pairing and gates input until paired.
//!
//! ```text
//! touch samples ─► GestureInterpreter ─► InputIntent ─┬─► encode_intent ─► HID reports
//!                                                     └─► SessionEngine ─► JSON envelopes
//! ```

pub mod domain;
pub mod hid;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `rb_core::GestureInterpreter` instead of `rb_core::domain::gesture::GestureInterpreter`.
pub use domain::gesture::{GestureConfig, GestureInterpreter, TouchPhase, TouchSample};
pub use domain::intent::{intents_for_text, InputIntent, MouseButton};
pub use hid::report::{decode_mouse_report, encode_intent, HidReport, ReportId};
pub use keymap::hid::{HidKeyCode, KeyStroke};
pub use protocol::codec::{decode_envelope, encode_envelope, Envelope, ProtocolError};
pub use protocol::messages::MessageType;
pub use protocol::pairing::PairingCode;
pub use protocol::session::{SessionEngine, SessionError, SessionEvent, SessionState};
