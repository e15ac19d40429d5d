//! Pairing bookkeeping: pending requests, failed attempts and lockouts.
//!
//! # Why lock out? (for beginners)
//!
//! A six-digit code has only a million values.  Without a limit, a peer on
//! the network could send `pair.confirm` with every value in turn until one
//! matches.  The gate counts wrong answers:
//!
//! - After `max_attempts` failures a device's pending request is dropped and
//!   the device may not ask again until its lockout expires.
//! - Because the device id is chosen by the sender, failures are also counted
//!   host-wide.  Once `max_failures_total` failures fall inside one lockout
//!   period, pairing is closed for every device until the period ends.
//!
//! Pending requests expire after the code TTL and their number is capped, so
//! unauthenticated peers cannot grow the map without bound.
//!
//! All times are epoch milliseconds supplied by the caller.

use std::collections::{HashMap, VecDeque};

use rb_core::protocol::messages::PairRequest;

/// Limits applied by a [`PairingGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingLimits {
    pub request_ttl_ms: u64,
    pub max_pending: usize,
    pub max_attempts: u32,
    pub lockout_ms: u64,
    pub max_failures_total: u32,
}

/// Why pairing is refused before any code is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lockout {
    /// This device failed too often.
    Device { until_ms: u64 },
    /// Too many failures across all devices.
    Host { until_ms: u64 },
}

/// Result of recording one failed confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The pending request survives; `remaining` attempts are left.
    Retry { remaining: u32 },
    /// The device is locked out and its request was dropped.
    DeviceLocked { until_ms: u64 },
    /// Pairing is closed for everyone; every pending request was dropped.
    HostLocked { until_ms: u64 },
}

#[derive(Debug)]
struct Pending {
    request: PairRequest,
    requested_at_ms: u64,
    failures: u32,
}

#[derive(Debug)]
pub struct PairingGate {
    limits: PairingLimits,
    pending: HashMap<String, Pending>,
    device_lockouts: HashMap<String, u64>,
    recent_failures: VecDeque<u64>,
    host_locked_until: Option<u64>,
}

impl PairingGate {
    pub fn new(limits: PairingLimits) -> Self {
        Self {
            limits: PairingLimits {
                max_pending: limits.max_pending.max(1),
                max_attempts: limits.max_attempts.max(1),
                max_failures_total: limits.max_failures_total.max(1),
                ..limits
            },
            pending: HashMap::new(),
            device_lockouts: HashMap::new(),
            recent_failures: VecDeque::new(),
            host_locked_until: None,
        }
    }

    /// Returns the lockout that currently applies to `device_id`, if any.
    pub fn lockout(&mut self, device_id: &str, now_ms: u64) -> Option<Lockout> {
        self.expire(now_ms);
        if let Some(until_ms) = self.host_locked_until {
            return Some(Lockout::Host { until_ms });
        }
        self.device_lockouts
            .get(device_id)
            .map(|&until_ms| Lockout::Device { until_ms })
    }

    /// Remembers `request`, replacing an earlier one from the same device.
    ///
    /// The failure count of a replaced request carries over.
    pub fn open(&mut self, device_id: &str, request: PairRequest, now_ms: u64) {
        self.expire(now_ms);
        let failures = self.pending.get(device_id).map_or(0, |p| p.failures);
        if !self.pending.contains_key(device_id) && self.pending.len() >= self.limits.max_pending {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|(_, p)| p.requested_at_ms)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                self.pending.remove(&id);
            }
        }
        self.pending.insert(
            device_id.to_owned(),
            Pending {
                request,
                requested_at_ms: now_ms,
                failures,
            },
        );
    }

    /// `true` if `device_id` has an unexpired request.
    pub fn is_pending(&mut self, device_id: &str, now_ms: u64) -> bool {
        self.expire(now_ms);
        self.pending.contains_key(device_id)
    }

    /// Removes and returns the pending request of `device_id`.
    pub fn take(&mut self, device_id: &str) -> Option<PairRequest> {
        self.pending.remove(device_id).map(|p| p.request)
    }

    /// Counts a wrong answer against the host and, when `device_id` has a
    /// pending request, against that device.
    pub fn record_failure(&mut self, device_id: &str, now_ms: u64) -> Failure {
        self.expire(now_ms);
        let lockout_until = now_ms.saturating_add(self.limits.lockout_ms);

        self.recent_failures.push_back(now_ms);
        if self.recent_failures.len() >= self.limits.max_failures_total as usize {
            self.host_locked_until = Some(lockout_until);
            self.recent_failures.clear();
            self.pending.clear();
            return Failure::HostLocked {
                until_ms: lockout_until,
            };
        }

        let Some(pending) = self.pending.get_mut(device_id) else {
            return Failure::Retry {
                remaining: self.limits.max_attempts,
            };
        };
        pending.failures += 1;
        if pending.failures >= self.limits.max_attempts {
            self.pending.remove(device_id);
            self.device_lockouts
                .insert(device_id.to_owned(), lockout_until);
            return Failure::DeviceLocked {
                until_ms: lockout_until,
            };
        }
        Failure::Retry {
            remaining: self.limits.max_attempts - pending.failures,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn locked_device_count(&self) -> usize {
        self.device_lockouts.len()
    }

    fn expire(&mut self, now_ms: u64) {
        let ttl = self.limits.request_ttl_ms;
        self.pending
            .retain(|_, p| now_ms.saturating_sub(p.requested_at_ms) <= ttl);
        self.device_lockouts.retain(|_, until| now_ms < *until);
        if self.host_locked_until.is_some_and(|until| now_ms >= until) {
            self.host_locked_until = None;
        }
        let window = self.limits.lockout_ms;
        while let Some(&oldest) = self.recent_failures.front() {
            if now_ms.saturating_sub(oldest) >= window {
                self.recent_failures.pop_front();
            } else {
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
