//! Stop coordination utilities.
//!
//! A [`StopCoordinator`] is shared between the CLI Ctrl+C handler and the
//! worker pool. Requesting a stop only prevents NEW page jobs from being
//! submitted; requests already in flight always run to completion so the
//! collected results stay well-formed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a stop coordinator.
pub type SharedStop = Arc<StopCoordinator>;

/// Coordinates an early stop across async tasks.
#[derive(Debug, Default)]
pub struct StopCoordinator {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            stopped: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedStop {
        Arc::new(Self::new())
    }

    /// Request a stop. Waiters are notified exactly once.
    pub fn request_stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Wait until a stop is requested. Returns immediately if already set.
    pub async fn wait_for_stop(&self) {
        if self.is_stop_requested() {
            return;
        }
        self.notify.notified().await;
    }
}
