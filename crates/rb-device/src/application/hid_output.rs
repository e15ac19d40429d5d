//! HidOutputUseCase: encodes intents as HID reports and sends them in order.
//!
//! This use case sits at the application layer and delegates to a
//! [`HidChannel`] trait object for the actual report transmission.  The
//! Bluetooth profile binding lives outside this crate; the infrastructure
//! layer provides logging and recording channels.

use std::sync::Arc;

use rb_core::{encode_intent, intents_for_text, HidReport, InputIntent};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single report was not delivered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HidSendError {
    /// No host is attached to the HID profile.
    #[error("HID channel is not connected")]
    NotConnected,
    /// The host stack refused the report.
    #[error("host rejected report: {0}")]
    Rejected(String),
}

/// Error type for the HID output use case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HidOutputError {
    /// The channel is not connected; nothing was sent.
    #[error("HID transport unavailable")]
    TransportUnavailable,
}

/// Capability to push one report to the host.
///
/// Implementations must deliver reports in call order.
#[cfg_attr(test, mockall::automock)]
pub trait HidChannel: Send + Sync {
    fn is_connected(&self) -> bool;

    fn send_report(&self, report: &HidReport) -> Result<(), HidSendError>;
}

/// Outcome of delivering a batch of intents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub reports_sent: usize,
    pub intents_dropped: usize,
}

/// The HID output use case.
pub struct HidOutputUseCase {
    channel: Arc<dyn HidChannel>,
}

impl HidOutputUseCase {
    pub fn new(channel: Arc<dyn HidChannel>) -> Self {
        Self { channel }
    }

    /// Sends every report of one intent, stopping at the first rejection.
    ///
    /// Returns the number of reports sent.  A rejected report is logged at
    /// warning level and the remainder of the intent is dropped; it is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`HidOutputError::TransportUnavailable`] if the channel is not
    /// connected.
    pub fn send_intent(&self, intent: &InputIntent) -> Result<usize, HidOutputError> {
        if !self.channel.is_connected() {
            return Err(HidOutputError::TransportUnavailable);
        }

        let mut sent = 0;
        for report in encode_intent(intent) {
            match self.channel.send_report(&report) {
                Ok(()) => sent += 1,
                Err(HidSendError::NotConnected) => {
                    return Err(HidOutputError::TransportUnavailable);
                }
                Err(e) => {
                    warn!(
                        report_id = report.report_id() as u8,
                        "dropping {intent:?}: {e}"
                    );
                    return Ok(sent);
                }
            }
        }
        debug!("sent {intent:?} as {sent} report(s)");
        Ok(sent)
    }

    /// Sends intents in order.  Rejections affect only their own intent.
    ///
    /// # Errors
    ///
    /// Returns [`HidOutputError::TransportUnavailable`] as soon as the channel
    /// reports it is disconnected; later intents are not attempted.
    pub fn send_all<I>(&self, intents: I) -> Result<DeliveryStats, HidOutputError>
    where
        I: IntoIterator<Item = InputIntent>,
    {
        let mut stats = DeliveryStats::default();
        for intent in intents {
            let expected = encode_intent(&intent).len();
            let sent = self.send_intent(&intent)?;
            stats.reports_sent += sent;
            if sent < expected {
                stats.intents_dropped += 1;
            }
        }
        Ok(stats)
    }

    /// Types `text`, skipping characters without a key mapping.
    pub fn send_text(&self, text: &str) -> Result<DeliveryStats, HidOutputError> {
        self.send_all(intents_for_text(text))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
