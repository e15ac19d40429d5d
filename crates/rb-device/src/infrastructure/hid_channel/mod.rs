//! HID channel adapters.
//!
//! The Bluetooth HID profile itself is owned by the platform; what reaches
//! this crate is a sink that accepts one report at a time.  Two adapters are
//! provided:
//!
//! - [`LoggingHidChannel`] – logs every report as hex.  This is what the
//!   binary uses when no platform HID service is attached.
//! - [`recording::RecordingHidChannel`] – keeps reports in memory so tests
//!   can assert on the exact byte sequence.

pub mod recording;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rb_core::HidReport;
use tracing::info;

use crate::application::hid_output::{HidChannel, HidSendError};

pub use recording::RecordingHidChannel;

/// Formats report bytes as space-separated hex, prefixed by the report id.
pub fn hex_dump(report: &HidReport) -> String {
    let mut out = format!("[{:02x}]", report.report_id() as u8);
    for byte in report.as_bytes() {
        out.push_str(&format!(" {byte:02x}"));
    }
    out
}

/// Writes each report to the log at info level.
pub struct LoggingHidChannel {
    connected: AtomicBool,
    sent: AtomicU64,
}

impl LoggingHidChannel {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            sent: AtomicU64::new(0),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Number of reports written so far.
    pub fn reports_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Default for LoggingHidChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl HidChannel for LoggingHidChannel {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn send_report(&self, report: &HidReport) -> Result<(), HidSendError> {
        if !self.is_connected() {
            return Err(HidSendError::NotConnected);
        }
        let seq = self.sent.fetch_add(1, Ordering::Relaxed);
        info!(seq, "hid report {}", hex_dump(report));
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_prefixes_report_id() {
        // Arrange
        let report = HidReport::Mouse([0x01, 0xff, 0x7f, 0x00]);

        // Act
        let text = hex_dump(&report);

        // Assert
        assert_eq!(text, "[01] 01 ff 7f 00");
    }

    #[test]
    fn test_logging_channel_counts_reports() {
        let channel = LoggingHidChannel::new();

        channel.send_report(&HidReport::MOUSE_IDLE).unwrap();
        channel.send_report(&HidReport::KEYBOARD_RELEASED).unwrap();

        assert_eq!(channel.reports_sent(), 2);
    }

    #[test]
    fn test_disconnected_logging_channel_refuses_reports() {
        let channel = LoggingHidChannel::new();
        channel.set_connected(false);

        let result = channel.send_report(&HidReport::MOUSE_IDLE);

        assert_eq!(result, Err(HidSendError::NotConnected));
        assert_eq!(channel.reports_sent(), 0);
    }
}
