//! rb-device library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does rb-device do? (for beginners)
//!
//! The *device* is the handheld touch screen acting as a touchpad and
//! keyboard for a host computer.  It:
//!
//! 1. Reads touch samples and turns them into input intents with the
//!    [`rb_core::GestureInterpreter`].
//! 2. Delivers those intents over one of two transports:
//!    - **HID**: fixed-layout binary reports sent over a Bluetooth HID
//!      channel, consumed by the host OS like a physical mouse/keyboard.
//!    - **Session**: JSON envelopes sent over a WebSocket to the host agent
//!      (`rb-agent`), after completing the pairing handshake.
//! 3. Persists its stable device id and gesture tuning in a TOML file.

/// Application layer: use cases for the device.
pub mod application;

/// Infrastructure layer: HID channels, WebSocket client, config file, script driver.
pub mod infrastructure;
