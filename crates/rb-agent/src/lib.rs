//! rb-agent library crate.
//!
//! The host-resident half of RemoteBrain.  Devices connect over WebSocket,
//! pair with a six-digit code shown on the host, and then send input
//! envelopes that the agent validates and hands to an [`InputSink`].
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Device (JSON envelopes over WebSocket)
//!         ↕
//! [rb-agent]
//!   ├── domain/           AgentConfig, HostCommand, TrustedDevice
//!   ├── application/      AgentService: validation, pairing, dispatch
//!   │                     guard: replay windows and rate limiting
//!   └── infrastructure/
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         ├── registry/   trusted_devices.json persistence
//!         └── input_sink/ logging sink standing in for OS injection
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `rb-core` only.  It owns the
//!   [`TrustStore`] and [`InputSink`] traits; infrastructure implements them.
//! - `infrastructure` depends on all other layers plus `tokio` and `tungstenite`.
//!
//! [`InputSink`]: application::agent_service::InputSink
//! [`TrustStore`]: application::agent_service::TrustStore

/// Domain layer: configuration and decoded command types (no I/O).
pub mod domain;

/// Application layer: envelope validation, pairing and dispatch.
pub mod application;

/// Infrastructure layer: WebSocket server, registry file, input sink.
pub mod infrastructure;
