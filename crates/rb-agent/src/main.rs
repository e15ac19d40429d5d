//! RemoteBrain host agent: entry point.
//!
//! Accepts WebSocket connections from RemoteBrain devices, pairs them with a
//! six-digit code shown in this process's log, and injects input from
//! trusted devices.
//!
//! # Usage
//!
//! ```text
//! rb-agent [OPTIONS]
//!
//! Options:
//!   --host              <IP>    Bind address [default: 0.0.0.0]
//!   --port              <PORT>  WebSocket port [default: 8765]
//!   --trusted-registry  <PATH>  Trusted-device file [default: trusted_devices.json]
//!   --rate-limit        <N>     Messages per device per second, 0 = off [default: 30]
//!   --replay-window     <N>     Remembered nonces/ids per device [default: 200]
//!   --max-clock-skew-ms <MS>    Timestamp window, 0 = off [default: 0]
//!   --pairing-code      <CODE>  Fixed pairing code [default: random per request]
//!   --max-pair-attempts <N>     Wrong codes before a device is locked out [default: 3]
//!   --pair-lockout-ms   <MS>    Lockout duration [default: 60000]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                     | Default                |
//! |------------------------------|------------------------|
//! | `RB_AGENT_HOST`              | `0.0.0.0`              |
//! | `RB_AGENT_PORT`              | `8765`                 |
//! | `RB_AGENT_TRUSTED_REGISTRY`  | `trusted_devices.json` |
//! | `RB_AGENT_RATE_LIMIT`        | `30`                   |
//! | `RB_AGENT_REPLAY_WINDOW`     | `200`                  |
//! | `RB_AGENT_MAX_CLOCK_SKEW_MS` | `0`                    |
//! | `RB_AGENT_PAIRING_CODE`      | unset                  |
//! | `RB_AGENT_MAX_PAIR_ATTEMPTS` | `3`                    |
//! | `RB_AGENT_PAIR_LOCKOUT_MS`   | `60000`                |
//!
//! Audit records are logged on the `audit` target; `RUST_LOG=info,audit=info`
//! keeps them, `RUST_LOG=audit=off` drops them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rb_agent::application::{AgentService, TrustStore};
use rb_agent::domain::config::DEFAULT_PORT;
use rb_agent::domain::AgentConfig;
use rb_agent::infrastructure::{run_server, JsonTrustStore, LoggingInputSink};
use rb_core::protocol::messages::PAIRING_CODE_TTL_MS;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// RemoteBrain host agent.
#[derive(Debug, Parser)]
#[command(name = "rb-agent", about = "Host agent for RemoteBrain devices", version)]
struct Cli {
    /// IP address to bind.  `127.0.0.1` accepts local connections only.
    #[arg(long, default_value = "0.0.0.0", env = "RB_AGENT_HOST")]
    host: String,

    /// WebSocket port.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "RB_AGENT_PORT")]
    port: u16,

    /// JSON file holding trusted devices.
    #[arg(long, default_value = "trusted_devices.json", env = "RB_AGENT_TRUSTED_REGISTRY")]
    trusted_registry: PathBuf,

    /// Accepted messages per device per second.  0 disables the limit.
    #[arg(long, default_value_t = 30, env = "RB_AGENT_RATE_LIMIT")]
    rate_limit: u32,

    /// Nonces and ids remembered per device for replay detection.
    #[arg(long, default_value_t = 200, env = "RB_AGENT_REPLAY_WINDOW")]
    replay_window: usize,

    /// Maximum distance between an envelope's ts and the host clock.  0 disables the check.
    #[arg(long, default_value_t = 0, env = "RB_AGENT_MAX_CLOCK_SKEW_MS")]
    max_clock_skew_ms: u64,

    /// Fixed six-digit pairing code.  Without it a fresh code is drawn per request.
    #[arg(long, env = "RB_AGENT_PAIRING_CODE")]
    pairing_code: Option<String>,

    /// Wrong pairing codes a device may send before it is locked out.
    #[arg(long, default_value_t = 3, env = "RB_AGENT_MAX_PAIR_ATTEMPTS")]
    max_pair_attempts: u32,

    /// How long a pairing lockout lasts.
    #[arg(long, default_value_t = 60_000, env = "RB_AGENT_PAIR_LOCKOUT_MS")]
    pair_lockout_ms: u64,
}

impl Cli {
    fn into_agent_config(self) -> anyhow::Result<AgentConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.host, self.port))?;

        Ok(AgentConfig {
            bind_addr,
            registry_path: self.trusted_registry,
            rate_limit_per_sec: self.rate_limit,
            replay_window: self.replay_window,
            pairing_code_ttl_ms: PAIRING_CODE_TTL_MS,
            max_clock_skew_ms: self.max_clock_skew_ms,
            pairing_code: self.pairing_code,
            max_pair_attempts: self.max_pair_attempts,
            pair_lockout_ms: self.pair_lockout_ms,
            ..AgentConfig::default()
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_agent_config()?;

    let registry = JsonTrustStore::load(&config.registry_path).with_context(|| {
        format!("failed to load trusted registry {}", config.registry_path.display())
    })?;
    for device in registry.devices() {
        info!("trusted: {} ({})", device.device_name, device.device_id);
    }

    let bind_addr = config.bind_addr;
    let fixed_code = config.pairing_code.is_some();
    let service = AgentService::new(config, Box::new(registry), Box::new(LoggingInputSink))
        .context("invalid --pairing-code")?;
    if fixed_code {
        info!("pairing code: {}", service.pairing_code());
    } else {
        info!("a pairing code is shown here when a device asks to pair");
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(bind_addr, Arc::new(Mutex::new(service)), running).await?;

    info!("RemoteBrain agent stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_produce_default_config() {
        // Arrange
        let cli = Cli::parse_from(["rb-agent"]);

        // Act
        let config = cli.into_agent_config().unwrap();

        // Assert
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "rb-agent",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--rate-limit",
            "5",
            "--pairing-code",
            "246810",
            "--max-pair-attempts",
            "5",
        ]);

        let config = cli.into_agent_config().unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.rate_limit_per_sec, 5);
        assert_eq!(config.pairing_code.as_deref(), Some("246810"));
        assert_eq!(config.max_pair_attempts, 5);
    }

    #[test]
    fn test_invalid_host_is_an_error() {
        let cli = Cli::parse_from(["rb-agent", "--host", "not-an-ip"]);
        assert!(cli.into_agent_config().is_err());
    }
}
