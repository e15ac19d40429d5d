//! Agent configuration types.
//!
//! [`AgentConfig`] holds every runtime setting.  `main.rs` fills it from CLI
//! flags (with `RB_AGENT_*` environment fallbacks); tests build it from
//! [`AgentConfig::default`] and override single fields.

use std::net::SocketAddr;
use std::path::PathBuf;

use rb_core::protocol::messages::PAIRING_CODE_TTL_MS;

/// Default WebSocket port the agent listens on.
pub const DEFAULT_PORT: u16 = 8765;

/// All runtime configuration for the host agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Address the WebSocket server binds to.
    pub bind_addr: SocketAddr,

    /// JSON file holding the trusted devices.
    pub registry_path: PathBuf,

    /// Accepted messages per device per second.  `0` disables the limit.
    pub rate_limit_per_sec: u32,

    /// How many recent nonces (and ids) are remembered per device.
    pub replay_window: usize,

    /// How long a pairing code stays valid after a `pair.request`.
    pub pairing_code_ttl_ms: u64,

    /// Largest accepted distance between an envelope's `ts` and the host
    /// clock.  `0` disables the check.
    pub max_clock_skew_ms: u64,

    /// Fixed pairing code.  `None` makes the agent draw a fresh random code
    /// for every pairing attempt.
    pub pairing_code: Option<String>,

    /// Wrong codes a device may send before it is locked out.
    pub max_pair_attempts: u32,

    /// How long a lockout lasts.
    pub pair_lockout_ms: u64,

    /// Wrong codes from all devices, within one lockout period, that close
    /// pairing for everyone.
    pub max_pair_failures_total: u32,

    /// Pairing requests remembered at once.
    pub max_pending_pairings: usize,

    /// Trusted devices with their own replay and rate-limit state.
    pub max_tracked_devices: usize,
}

impl Default for AgentConfig {
    /// | Field                   | Default                |
    /// |-------------------------|------------------------|
    /// | bind_addr               | `0.0.0.0:8765`         |
    /// | registry_path           | `trusted_devices.json` |
    /// | rate_limit_per_sec      | 30                     |
    /// | replay_window           | 200                    |
    /// | pairing_code_ttl_ms     | 60 000                 |
    /// | max_clock_skew_ms       | 0 (disabled)           |
    /// | pairing_code            | random                 |
    /// | max_pair_attempts       | 3                      |
    /// | pair_lockout_ms         | 60 000                 |
    /// | max_pair_failures_total | 10                     |
    /// | max_pending_pairings    | 64                     |
    /// | max_tracked_devices     | 1024                   |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            registry_path: PathBuf::from("trusted_devices.json"),
            rate_limit_per_sec: 30,
            replay_window: 200,
            pairing_code_ttl_ms: PAIRING_CODE_TTL_MS,
            max_clock_skew_ms: 0,
            pairing_code: None,
            max_pair_attempts: 3,
            pair_lockout_ms: 60_000,
            max_pair_failures_total: 10,
            max_pending_pairings: 64,
            max_tracked_devices: 1024,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
