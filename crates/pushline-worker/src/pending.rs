//! Pending-work tokens.
//!
//! The runtime may reclaim an idle background worker at any time. Every
//! event handler holds a [`WorkToken`] for as long as it has work in flight;
//! the runtime consults [`PendingWork::in_flight`] (or awaits
//! [`PendingWork::idle`]) before tearing the worker down.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Counter of in-flight event handlers, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct PendingWork {
    inner: Arc<Inner>,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit of pending work. Dropping the token releases it.
    pub fn token(&self) -> WorkToken {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        WorkToken {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Wait until no work is pending.
    pub async fn idle(&self) {
        loop {
            let mut notified = std::pin::pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// RAII guard for one unit of pending work.
#[derive(Debug)]
#[must_use = "work is only pending while the token is held"]
pub struct WorkToken {
    inner: Arc<Inner>,
}

impl Drop for WorkToken {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
