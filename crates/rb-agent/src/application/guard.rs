//! Replay and flood protection.
//!
//! # Replay windows (for beginners)
//!
//! Every envelope carries a random `nonce` and a unique `id`.  An attacker
//! who records a frame on the network could send it again later; the agent
//! spots this by remembering the last few hundred tokens each device used
//! and refusing any repeat.  The memory is bounded: once a device has used
//! `capacity` tokens, the oldest one is forgotten.
//!
//! # Rate limiting
//!
//! [`RateLimiter`] keeps a one-second sliding window of accepted messages per
//! device.  The caller passes the current [`Instant`] so tests can drive the
//! clock explicitly.
//!
//! # Bounded state
//!
//! Keys are chosen by the sender, so both guards cap the number of devices
//! they track and evict the least recently used one when a new key arrives.
//! The rate limiter also drops devices whose window has run empty.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Default cap on the number of devices a guard tracks.
pub const DEFAULT_MAX_DEVICES: usize = 1024;

#[derive(Debug, Default)]
struct DeviceWindow {
    order: VecDeque<String>,
    seen: HashSet<String>,
    last_used: u64,
}

/// Remembers the most recent tokens per device.
#[derive(Debug)]
pub struct ReplayWindow {
    capacity: usize,
    max_devices: usize,
    tick: u64,
    devices: HashMap<String, DeviceWindow>,
}

impl ReplayWindow {
    pub fn new(capacity: usize) -> Self {
        Self::with_max_devices(capacity, DEFAULT_MAX_DEVICES)
    }

    pub fn with_max_devices(capacity: usize, max_devices: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            max_devices: max_devices.max(1),
            tick: 0,
            devices: HashMap::new(),
        }
    }

    /// Records `token` for `device_id`.
    ///
    /// Returns `false` if the token is empty or was already seen inside the
    /// window; the window is unchanged in that case.
    pub fn check_and_record(&mut self, device_id: &str, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        if !self.devices.contains_key(device_id) && self.devices.len() >= self.max_devices {
            self.evict_least_recent();
        }

        self.tick += 1;
        let window = self.devices.entry(device_id.to_owned()).or_default();
        window.last_used = self.tick;
        if window.seen.contains(token) {
            return false;
        }

        window.order.push_back(token.to_owned());
        window.seen.insert(token.to_owned());
        while window.order.len() > self.capacity {
            if let Some(evicted) = window.order.pop_front() {
                window.seen.remove(&evicted);
            }
        }
        true
    }

    /// Number of tokens currently remembered for `device_id`.
    pub fn len(&self, device_id: &str) -> usize {
        self.devices.get(device_id).map_or(0, |w| w.order.len())
    }

    /// Number of devices with a window.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .devices
            .iter()
            .min_by_key(|(_, w)| w.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.devices.remove(&id);
        }
    }
}

/// Per-device sliding-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: u32,
    max_devices: usize,
    last_sweep: Option<Instant>,
    devices: HashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    /// `per_second == 0` disables limiting.
    pub fn new(per_second: u32) -> Self {
        Self::with_max_devices(per_second, DEFAULT_MAX_DEVICES)
    }

    pub fn with_max_devices(per_second: u32, max_devices: usize) -> Self {
        Self {
            per_second,
            max_devices: max_devices.max(1),
            last_sweep: None,
            devices: HashMap::new(),
        }
    }

    /// Returns `true` and counts the message if `device_id` is under its limit
    /// at `now`.
    pub fn allow_at(&mut self, device_id: &str, now: Instant) -> bool {
        if self.per_second == 0 {
            return true;
        }
        self.sweep_idle(now);
        if !self.devices.contains_key(device_id) && self.devices.len() >= self.max_devices {
            self.evict_least_recent();
        }

        let stamps = self.devices.entry(device_id.to_owned()).or_default();
        while let Some(oldest) = stamps.front() {
            if now.saturating_duration_since(*oldest) >= RATE_WINDOW {
                stamps.pop_front();
            } else {
                break;
            }
        }
        if stamps.len() >= self.per_second as usize {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Number of devices with a live window.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Drops devices with no message inside the window, at most once per window.
    fn sweep_idle(&mut self, now: Instant) {
        if self
            .last_sweep
            .is_some_and(|last| now.saturating_duration_since(last) < RATE_WINDOW)
        {
            return;
        }
        self.last_sweep = Some(now);
        self.devices.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < RATE_WINDOW)
        });
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .devices
            .iter()
            .min_by_key(|(_, stamps)| stamps.back().copied())
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.devices.remove(&id);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
