//! Input sinks.
//!
//! Injecting into the host OS (SendInput, XTest, CoreGraphics) is outside
//! this crate.  The agent binary uses [`LoggingInputSink`], which checks key
//! names against the device key table and logs what it would inject.
//! [`RecordingInputSink`] keeps commands in memory for tests.

use std::sync::Mutex;

use rb_core::protocol::messages::SHIFT_KEY;
use rb_core::HidKeyCode;
use tracing::info;

use crate::application::{InputSink, SinkError};
use crate::domain::HostCommand;

/// Returns `true` for key names a device can send.
pub fn is_known_key(name: &str) -> bool {
    name == SHIFT_KEY || (0u8..=0xFF).filter_map(HidKeyCode::from_u8).any(|k| k.key_name() == name)
}

fn check(command: &HostCommand) -> Result<(), SinkError> {
    match command {
        HostCommand::Key { key, .. } if !is_known_key(key) => {
            Err(SinkError::UnsupportedKey(key.clone()))
        }
        _ => Ok(()),
    }
}

/// Logs each command at info level instead of injecting it.
#[derive(Debug, Default)]
pub struct LoggingInputSink;

impl InputSink for LoggingInputSink {
    fn apply(&self, command: &HostCommand) -> Result<(), SinkError> {
        check(command)?;
        info!("inject {command}");
        Ok(())
    }
}

/// Records every accepted command.
#[derive(Debug, Default)]
pub struct RecordingInputSink {
    pub commands: Mutex<Vec<HostCommand>>,
}

impl RecordingInputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<HostCommand> {
        self.commands
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl InputSink for RecordingInputSink {
    fn apply(&self, command: &HostCommand) -> Result<(), SinkError> {
        check(command)?;
        self.commands
            .lock()
            .map_err(|_| SinkError::Platform("recorder poisoned".into()))?
            .push(command.clone());
        Ok(())
    }
}

// Shared so tests can keep a handle while the service owns the box.
impl<T: InputSink> InputSink for std::sync::Arc<T> {
    fn apply(&self, command: &HostCommand) -> Result<(), SinkError> {
        (**self).apply(command)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
