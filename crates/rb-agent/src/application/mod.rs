//! Application layer for rb-agent.
//!
//! Knows *what* to do with a frame: validate it, answer pairing messages,
//! and turn trusted input into [`HostCommand`](crate::domain::HostCommand)s.
//! *How* devices connect, where trust is stored and how input reaches the
//! OS are infrastructure concerns behind the [`TrustStore`] and
//! [`InputSink`] traits.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or spawning tasks
//! - Reading or writing files
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod agent_service;
pub mod guard;
pub mod pairing;

pub use agent_service::{
    reasons, AgentService, InputSink, Now, RegistryError, SinkError, TrustStore,
};
