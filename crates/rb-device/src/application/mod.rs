//! Application layer use cases for the device.
//!
//! # What use cases does the device have?
//!
//! - **`hid_output`** – Encodes intents as HID reports and pushes them, in
//!   order, through a [`hid_output::HidChannel`] injected at construction.
//!   Rejected reports are logged and the rest of that intent is dropped.
//!
//! - **`remote_session`** – Drives the pairing handshake and forwards
//!   intents as JSON envelopes through a [`remote_session::MessageChannel`].
//!   Input is refused locally until the session is paired.

pub mod hid_output;
pub mod remote_session;
