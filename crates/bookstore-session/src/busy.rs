//! In-flight request counter for UI busy indicators

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics;

/// Shared count of dispatches that have started but not settled.
///
/// Clones share the same count. `enter()` increments and the returned guard
/// decrements on drop, so the count stays balanced even when a caller
/// abandons a `send` future midway.
#[derive(Debug, Clone, Default)]
pub struct BusyCounter {
    in_flight: Arc<AtomicU64>,
}

impl BusyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.current() > 0
    }

    pub fn enter(&self) -> BusyGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::busy_entered();
        BusyGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Decrements the owning counter on drop.
#[derive(Debug)]
pub struct BusyGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        metrics::busy_left();
    }
}
