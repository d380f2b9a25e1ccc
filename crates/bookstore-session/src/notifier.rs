//! Session invalidation sink
//!
//! The dispatcher reports "this session can't be recovered" through a
//! `SessionNotifier` handed to it at construction. What happens next (clearing
//! the cart, redirecting to sign-in, calling logout) belongs to the
//! application. `SignOutLatch` is the stock consumer: it turns any number of
//! invalidations into a single observable sign-out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};

/// Receives "session is no longer valid" signals.
///
/// Fire-and-forget: `invalidate` must not block, and must tolerate being
/// called several times for one underlying loss of session.
pub trait SessionNotifier: Send + Sync {
    fn invalidate(&self);
}

impl<F> SessionNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn invalidate(&self) {
        self()
    }
}

/// Collapses repeated invalidations into one sign-out.
///
/// Starts armed. The first `invalidate()` disarms it and publishes the
/// sign-out; later calls are ignored until `rearm()` is called after a new
/// login.
#[derive(Debug)]
pub struct SignOutLatch {
    armed: AtomicBool,
    sign_outs: AtomicU64,
    signed_out: watch::Sender<bool>,
}

impl SignOutLatch {
    pub fn new() -> Self {
        let (signed_out, _) = watch::channel(false);
        Self {
            armed: AtomicBool::new(true),
            sign_outs: AtomicU64::new(0),
            signed_out,
        }
    }

    /// Watch for the sign-out. The value flips to `true` once per arming.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signed_out.subscribe()
    }

    pub fn is_signed_out(&self) -> bool {
        *self.signed_out.borrow()
    }

    /// Number of sign-outs published since creation.
    pub fn sign_outs(&self) -> u64 {
        self.sign_outs.load(Ordering::SeqCst)
    }

    /// Wait until the session has been signed out.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        // Err only if the sender is gone, which can't happen while &self lives
        let _ = rx.wait_for(|signed_out| *signed_out).await;
    }

    /// Re-arm after a successful login.
    pub fn rearm(&self) {
        self.signed_out.send_replace(false);
        self.armed.store(true, Ordering::SeqCst);
        debug!("sign-out latch re-armed");
    }
}

impl Default for SignOutLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionNotifier for SignOutLatch {
    fn invalidate(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            let total = self.sign_outs.fetch_add(1, Ordering::SeqCst) + 1;
            self.signed_out.send_replace(true);
            info!(sign_outs = total, "session invalidated, signing out");
        } else {
            debug!("session already invalidated, ignoring");
        }
    }
}
