//! Single-flight credential refresh
//!
//! Any number of requests can discover an expired credential at the same
//! moment. The coordinator makes sure only one of them triggers a refresh;
//! the rest wait on that same refresh and all see its result.
//!
//! State is `Idle` or `InFlight(shared)`. The check-and-set from `Idle` to
//! `InFlight` happens under a mutex that is never held across an await. The
//! refresh runs on its own task so that it completes (and the state returns to
//! `Idle`) even if every caller that was waiting on it is dropped.

use std::sync::Arc;

use bookstore_auth::{CredentialRefresher, RefreshError};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::metrics;

type SharedRefresh = Shared<BoxFuture<'static, Result<(), RefreshError>>>;

enum RefreshState {
    Idle,
    InFlight(SharedRefresh),
}

/// Resets the coordinator to `Idle` when the refresh task ends, including by
/// panic. Dropped inside the task, so it runs before the task's result is
/// visible to any waiter.
struct ResetToIdle(Arc<Mutex<RefreshState>>);

impl Drop for ResetToIdle {
    fn drop(&mut self) {
        *self.0.lock() = RefreshState::Idle;
    }
}

/// Owns the single-flight refresh state for one session.
///
/// Build one per session and share it (via `Arc`) between every dispatcher
/// that sends requests with the same credential.
pub struct RefreshCoordinator {
    refresher: Arc<dyn CredentialRefresher>,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshCoordinator {
    pub fn new(refresher: Arc<dyn CredentialRefresher>) -> Self {
        Self {
            refresher,
            state: Arc::new(Mutex::new(RefreshState::Idle)),
        }
    }

    /// Whether a refresh is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock(), RefreshState::InFlight(_))
    }

    /// Make sure the credential has been renewed since the caller saw it expire.
    ///
    /// Starts a refresh if none is running, otherwise joins the running one.
    /// Every caller that joins a refresh gets that refresh's result. Once it
    /// has settled, the next call starts a new refresh rather than reusing
    /// the old result.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn ensure_fresh(&self) -> Result<(), RefreshError> {
        let pending = {
            let mut state = self.state.lock();
            match &*state {
                RefreshState::InFlight(pending) => {
                    debug!("joining in-flight credential refresh");
                    metrics::record_refresh_joined();
                    pending.clone()
                }
                RefreshState::Idle => {
                    // Lock stays held until InFlight is stored, so the task's
                    // reset can't run before it
                    let pending = self.start_refresh();
                    *state = RefreshState::InFlight(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    fn start_refresh(&self) -> SharedRefresh {
        info!("starting credential refresh");
        let refresher = Arc::clone(&self.refresher);
        let reset = ResetToIdle(Arc::clone(&self.state));

        let task = tokio::spawn(async move {
            let _reset = reset;
            let result = refresher.refresh().await;
            match &result {
                Ok(()) => info!("credential refresh succeeded"),
                Err(e) => warn!(error = %e, "credential refresh failed"),
            }
            metrics::record_refresh(result.is_ok());
            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| Err(RefreshError::Interrupted(e.to_string())))
        })
        .boxed()
        .shared()
    }
}
