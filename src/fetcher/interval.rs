//! Global request interval gate
//!
//! Enforces a minimum spacing between consecutive outgoing requests across
//! ALL workers of a search, approximating politeness toward the remote server
//! independently of the worker count.
//!
//! The gate is an explicit shared object: one mutex-guarded "next permitted
//! instant" that every worker goes through. There is deliberately no
//! module-level state; each search owns its own gate.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Minimum-spacing gate shared by all workers of one search.
#[derive(Debug)]
pub struct IntervalGate {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl IntervalGate {
    /// Create a gate enforcing `interval` between permitted requests.
    /// A zero interval disables spacing entirely.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// The configured spacing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block the caller until its request slot is reached.
    ///
    /// Each call reserves the earliest free slot (now, or the previously
    /// handed-out slot plus the interval) under the lock, then sleeps outside
    /// the lock until that slot arrives. Two consecutive permitted requests
    /// are therefore spaced at least `interval` apart, regardless of how many
    /// workers call concurrently.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };

        let now = Instant::now();
        if slot > now {
            sleep(slot - now).await;
        }
    }
}
