//! Authenticated request dispatch with refresh-and-retry-once
//!
//! `send` walks one `Attempt` through the transitions in `attempt.rs` and
//! performs the I/O between them: issue the request, wait on the shared
//! refresh, replay once, then settle (invalidating the session first when the
//! settlement says so).

use std::sync::Arc;

use tracing::{Span, debug, instrument, warn};
use transport::{Request, Transport};

use crate::attempt::{AfterRefresh, AfterResponse, Attempt, Settlement};
use crate::busy::BusyCounter;
use crate::coordinator::RefreshCoordinator;
use crate::metrics;
use crate::notifier::SessionNotifier;
use crate::outcome::Outcome;

/// Sends requests on behalf of one signed-in session.
///
/// Cheap to share behind an `Arc`; every collaborator is injected so tests
/// can build isolated instances.
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    coordinator: Arc<RefreshCoordinator>,
    notifier: Arc<dyn SessionNotifier>,
    busy: BusyCounter,
}

impl RequestDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        coordinator: Arc<RefreshCoordinator>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Self {
        Self {
            transport,
            coordinator,
            notifier,
            busy: BusyCounter::new(),
        }
    }

    /// Use an externally owned busy counter (e.g. one a UI is watching).
    pub fn with_busy_counter(mut self, busy: BusyCounter) -> Self {
        self.busy = busy;
        self
    }

    pub fn busy(&self) -> &BusyCounter {
        &self.busy
    }

    /// Send `request`, recovering from one credential expiry.
    ///
    /// - 401: session sink notified, `Failure(Unauthorized)` returned. This
    ///   holds for the replay too.
    /// - 410: shared refresh awaited, then the request replayed once. A
    ///   second 410 is returned as-is. A failed refresh notifies the session
    ///   sink and returns `Failure(Expired)`.
    /// - anything else: returned directly, never retried
    #[instrument(skip_all, fields(request_id = tracing::field::Empty, method = %request.method, target = %request.target))]
    pub async fn send(&self, request: &Request) -> Outcome {
        let _busy = self.busy.enter();
        let mut attempt = Attempt::new();
        Span::current().record("request_id", attempt.request_id());

        loop {
            let outcome = self.issue(request).await;
            let awaiting = match attempt.on_response(outcome) {
                AfterResponse::Settle(settlement) => return self.settle(settlement),
                AfterResponse::Refresh(awaiting) => awaiting,
            };

            debug!("credential expired, waiting on refresh");
            match awaiting.on_refresh(self.coordinator.ensure_fresh().await) {
                AfterRefresh::Reissue(next) => {
                    debug!("replaying request after refresh");
                    attempt = next;
                }
                AfterRefresh::Settle(settlement) => return self.settle(settlement),
            }
        }
    }

    fn settle(&self, settlement: Settlement) -> Outcome {
        let Settlement {
            outcome,
            invalidate,
            retried,
        } = settlement;
        if let Some(reason) = invalidate {
            warn!(reason = reason.label(), retried, "session invalid, notifying");
            metrics::record_invalidation(reason);
            self.notifier.invalidate();
        }
        if let Outcome::Failure { kind, message } = &outcome {
            debug!(kind = kind.label(), error = %message, retried, "request failed");
        }
        metrics::record_request(&outcome);
        outcome
    }

    async fn issue(&self, request: &Request) -> Outcome {
        match self.transport.execute(request).await {
            Ok(response) => {
                debug!(status = response.status, "response received");
                Outcome::from_response(response)
            }
            Err(e) => {
                warn!(error = %e, "request did not complete");
                Outcome::from_transport_error(&e)
            }
        }
    }
}
