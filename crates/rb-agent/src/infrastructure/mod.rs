//! Infrastructure layer for rb-agent.
//!
//! - **`ws_server`** – WebSocket accept loop; one Tokio task per device
//!   connection, all sharing one [`AgentService`](crate::application::AgentService).
//! - **`registry`** – `trusted_devices.json` persistence ([`JsonTrustStore`])
//!   and an in-memory store for tests.
//! - **`input_sink`** – [`LoggingInputSink`], which logs each command instead
//!   of injecting it, and [`RecordingInputSink`] for tests.

pub mod input_sink;
pub mod registry;
pub mod ws_server;

pub use input_sink::{LoggingInputSink, RecordingInputSink};
pub use registry::{InMemoryTrustStore, JsonTrustStore};
pub use ws_server::run_server;
