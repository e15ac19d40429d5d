//! Domain layer for rb-agent.
//!
//! Plain data types with no I/O:
//!
//! - [`config::AgentConfig`] – every runtime setting, built once at startup.
//! - [`command::HostCommand`] – an input envelope decoded into something the
//!   host can inject.
//! - [`device::TrustedDevice`] – one entry of the trusted-device registry.

pub mod command;
pub mod config;
pub mod device;

pub use command::HostCommand;
pub use config::AgentConfig;
pub use device::TrustedDevice;
