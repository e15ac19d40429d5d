//! In-memory HID channel for tests.
//!
//! # Why a recording channel?
//!
//! A real HID channel hands bytes to the Bluetooth stack, where nothing in a
//! test can observe them.  `RecordingHidChannel` pushes every accepted report
//! into a `Mutex<Vec<HidReport>>` so assertions can check exactly what was
//! emitted and in what order.
//!
//! # Failure injection
//!
//! - `connected = false` makes the channel report itself as unavailable.
//! - `reject_every` refuses every n-th report with
//!   [`HidSendError::Rejected`], to exercise the drop-rest-of-intent path.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use rb_core::HidReport;

use crate::application::hid_output::{HidChannel, HidSendError};

/// A channel that records reports instead of transmitting them.
#[derive(Default)]
pub struct RecordingHidChannel {
    /// Every accepted report, in send order.
    pub reports: Mutex<Vec<HidReport>>,
    /// Refuse every n-th attempted report (1-based).  `None` accepts all.
    pub reject_every: Option<usize>,
    disconnected: AtomicBool,
    attempts: AtomicUsize,
}

impl RecordingHidChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_every(n: usize) -> Self {
        Self {
            reject_every: Some(n),
            ..Self::default()
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::Relaxed);
    }

    /// Returns a copy of the recorded reports.
    pub fn snapshot(&self) -> Vec<HidReport> {
        self.reports
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl HidChannel for RecordingHidChannel {
    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::Relaxed)
    }

    fn send_report(&self, report: &HidReport) -> Result<(), HidSendError> {
        if !self.is_connected() {
            return Err(HidSendError::NotConnected);
        }
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if matches!(self.reject_every, Some(n) if n > 0 && attempt % n == 0) {
            return Err(HidSendError::Rejected(format!("attempt {attempt}")));
        }
        self.reports
            .lock()
            .map_err(|_| HidSendError::Rejected("recorder poisoned".to_string()))?
            .push(*report);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
