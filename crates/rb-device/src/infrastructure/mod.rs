//! Infrastructure layer for the device application.
//!
//! Contains the adapters behind the application-layer seams: HID report
//! channels, the WebSocket client, the TOML config file and the line-based
//! touch script reader.
//!
//! **Dependency rule**: this layer may depend on `application` and `rb_core`,
//! but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`hid_channel`** – [`HidChannel`](crate::application::hid_output::HidChannel)
//!   implementations.  `LoggingHidChannel` writes each report as hex to the
//!   log; `RecordingHidChannel` keeps reports in memory for tests.
//!
//! - **`network`** – WebSocket client that connects to the host agent,
//!   forwards inbound text frames and reconnects automatically when the
//!   connection drops.
//!
//! - **`storage`** – Reads and writes `device.toml` (stable device id, display
//!   name, agent URL and gesture tuning).
//!
//! - **`touch_script`** – Parses the `down 0 10 20 0` style lines the binary
//!   reads from stdin in place of a real touch panel.

pub mod hid_channel;
pub mod network;
pub mod storage;
pub mod touch_script;
