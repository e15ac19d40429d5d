//! RemoteBrain device entry point.
//!
//! Reads touch samples (and `type`, `media`, `pair` commands) from stdin,
//! turns them into input intents, and delivers those intents over the chosen
//! transport.
//!
//! # Usage
//!
//! ```text
//! rb-device [OPTIONS]
//!
//! Options:
//!   --config      <PATH>         device.toml location [default: platform config dir]
//!   --transport   <hid|session>  Delivery transport [default: session]
//!   --url         <URL>          Agent WebSocket URL (overrides the config file)
//!   --pair-code   <CODE>         Pair automatically on every (re)connect
//!   --device-name <NAME>         Name shown to the host (overrides the config file)
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_or_create(device.toml)   -- stable device id + gesture tuning
//!  └─ WsClientConnection::start()   -- WebSocket reconnect loop (session only)
//!  └─ select! loop
//!       ├─ stdin line      -> GestureInterpreter -> HID reports | envelopes
//!       ├─ Connected       -> pair again with the last code
//!       ├─ TextReceived    -> RemoteSessionUseCase::handle_inbound
//!       └─ Disconnected    -> session is unpaired until the next pair.result
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use rb_core::{GestureInterpreter, InputIntent, SessionEvent};
use rb_device::application::hid_output::HidOutputUseCase;
use rb_device::application::remote_session::{DeviceIdentity, RemoteSessionUseCase};
use rb_device::infrastructure::hid_channel::LoggingHidChannel;
use rb_device::infrastructure::network::{
    NetworkEvent, WsClientConfig, WsClientConnection,
};
use rb_device::infrastructure::storage::config::{default_config_path, load_or_create, DeviceConfig};
use rb_device::infrastructure::touch_script::{parse_line, ScriptCommand};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Binary HID reports over the Bluetooth HID channel.
    Hid,
    /// JSON envelopes over a WebSocket to the host agent.
    Session,
}

/// RemoteBrain handheld touchpad and keyboard.
#[derive(Debug, Parser)]
#[command(name = "rb-device", about = "Touchpad and keyboard for a RemoteBrain host", version)]
struct Cli {
    /// Path of device.toml.  Defaults to the platform config directory.
    #[arg(long, env = "RB_DEVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Delivery transport.
    #[arg(long, value_enum, default_value_t = Transport::Session, env = "RB_DEVICE_TRANSPORT")]
    transport: Transport,

    /// Agent WebSocket URL, e.g. ws://192.168.1.20:8765.
    #[arg(long, env = "RB_DEVICE_URL")]
    url: Option<String>,

    /// Six-digit code shown by the host.  Used on every (re)connect.
    #[arg(long, env = "RB_PAIR_CODE")]
    pair_code: Option<String>,

    /// Name shown to the host operator.
    #[arg(long, env = "RB_DEVICE_NAME")]
    device_name: Option<String>,
}

impl Cli {
    /// Loads device.toml and applies command-line overrides.
    fn load_device_config(&self) -> anyhow::Result<DeviceConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path().context("no --config given")?,
        };
        let mut config = load_or_create(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;

        if let Some(url) = &self.url {
            config.agent_url = url.clone();
        }
        if let Some(name) = &self.device_name {
            config.device_name = name.clone();
        }
        Ok(config)
    }
}

// ── Intent delivery ───────────────────────────────────────────────────────────

enum Output {
    Hid(HidOutputUseCase),
    Session(Arc<RemoteSessionUseCase>),
}

impl Output {
    async fn deliver(&self, intent: &InputIntent) {
        match self {
            Output::Hid(uc) => {
                if let Err(e) = uc.send_intent(intent) {
                    warn!("{e}");
                }
            }
            Output::Session(uc) => {
                if let Err(e) = uc.send_intent(intent).await {
                    warn!("{e}");
                }
            }
        }
    }
}

/// Applies one stdin command.  Returns the pairing code if the line set one.
async fn run_command(
    command: ScriptCommand,
    interpreter: &mut GestureInterpreter,
    output: &Output,
) -> Option<String> {
    match command {
        ScriptCommand::Touch(samples) => {
            for intent in interpreter.on_frame(&samples) {
                output.deliver(&intent).await;
            }
            None
        }
        ScriptCommand::Type(text) => {
            for intent in rb_core::intents_for_text(&text) {
                output.deliver(&intent).await;
            }
            None
        }
        ScriptCommand::Media(command) => {
            match output {
                Output::Session(uc) => {
                    if let Err(e) = uc.send_media(command).await {
                        warn!("{e}");
                    }
                }
                Output::Hid(_) => warn!("media commands need the session transport"),
            }
            None
        }
        ScriptCommand::Pair(code) => {
            match output {
                Output::Session(uc) => {
                    if let Err(e) = uc.pair(&code).await {
                        warn!("{e}");
                        return None;
                    }
                }
                Output::Hid(_) => {
                    warn!("pairing applies to the session transport only");
                    return None;
                }
            }
            Some(code)
        }
    }
}

fn report_session_event(event: SessionEvent) {
    match event {
        SessionEvent::Challenge { expires_in_ms } => {
            info!("enter the code shown on the host (valid for {} s)", expires_in_ms / 1000);
        }
        SessionEvent::Paired { .. } => info!("paired"),
        SessionEvent::PairingFailed { reason } => warn!("pairing failed: {reason}"),
        SessionEvent::Unpaired { reason } => warn!("host revoked pairing: {reason}"),
        SessionEvent::Acknowledged => debug!("host acknowledged"),
        SessionEvent::Rejected { reason } => warn!("host rejected input: {reason}"),
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

    let cli = Cli::parse();
    let config = cli.load_device_config()?;
    info!(
        "RemoteBrain device {} ({}) starting, transport={:?}",
        config.device_name, config.device_id, cli.transport
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let mut interpreter = GestureInterpreter::new(config.gesture);
    let mut pair_code = cli.pair_code.clone();

    // ── Transport ─────────────────────────────────────────────────────────────
    let (output, mut network_rx) = match cli.transport {
        Transport::Hid => {
            let channel = Arc::new(LoggingHidChannel::new());
            (Output::Hid(HidOutputUseCase::new(channel)), None)
        }
        Transport::Session => {
            let connection = Arc::new(WsClientConnection::new(WsClientConfig {
                url: config.agent_url.clone(),
                ..Default::default()
            }));
            let network_rx = Arc::clone(&connection).start(Arc::clone(&running)).await;
            let session = RemoteSessionUseCase::new(
                connection,
                DeviceIdentity {
                    device_id: config.device_id.clone(),
                    device_name: config.device_name.clone(),
                    public_key: config.public_key.clone(),
                },
            );
            (Output::Session(Arc::new(session)), Some(network_rx))
        }
    };

    // ── Main loop ─────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("reading touch script from stdin");

    while running.load(Ordering::Relaxed) {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(Some(command)) => {
                        if let Some(code) = run_command(command, &mut interpreter, &output).await {
                            pair_code = Some(code);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("ignoring line '{line}': {e}"),
                },
                Ok(None) => {
                    info!("end of input");
                    break;
                }
                Err(e) => {
                    error!("stdin read error: {e}");
                    break;
                }
            },
            event = recv_network(&mut network_rx) => {
                let Output::Session(session) = &output else { continue };
                match event {
                    Some(NetworkEvent::Connected { url }) => {
                        info!("connected to {url}");
                        if let Some(code) = &pair_code {
                            if let Err(e) = session.pair(code).await {
                                warn!("{e}");
                            }
                        } else {
                            info!("pair first: send 'pair <code>' with the code shown on the host");
                        }
                    }
                    Some(NetworkEvent::Disconnected) => {
                        session.on_disconnect().await;
                        interpreter.reset();
                        warn!("agent connection lost; reconnect in progress");
                    }
                    Some(NetworkEvent::TextReceived(text)) => {
                        if let Some(event) = session.handle_inbound(&text).await {
                            report_session_event(event);
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
        }
    }

    info!("RemoteBrain device stopped");
    Ok(())
}

/// Waits for the next network event, or forever when there is no network.
async fn recv_network(rx: &mut Option<mpsc::Receiver<NetworkEvent>>) -> Option<NetworkEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
