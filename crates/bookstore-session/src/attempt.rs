//! Per-call retry state machine
//!
//! Pure transitions, no I/O. Each state is its own type and each transition
//! consumes it, so an event can only be applied in the state that expects it.
//! The dispatcher performs the I/O between transitions.
//!
//! ```text
//! Attempt --on_response(Expired)--> AwaitingRefresh --on_refresh(Ok)--> Attempt (retried)
//!    |                                     |
//!    +--on_response(other)--> Settlement <-+--on_refresh(Err)
//! ```
//!
//! The `retried` flag lives on the `Attempt`, not on the `Request`, so two
//! calls sending the same request value never share retry state. Once set it
//! is never cleared, which is what bounds every call to one replay.

use bookstore_auth::RefreshError;
use uuid::Uuid;

use crate::outcome::{FailureKind, Outcome};

/// Why the dispatcher must notify the session sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    Unauthorized,
    RefreshFailed,
}

impl Invalidation {
    pub fn label(&self) -> &'static str {
        match self {
            Invalidation::Unauthorized => "unauthorized",
            Invalidation::RefreshFailed => "refresh_failed",
        }
    }
}

/// Terminal result of one call.
#[derive(Debug, PartialEq, Eq)]
pub struct Settlement {
    pub outcome: Outcome,
    /// Set when the session sink must hear about this call before it returns
    pub invalidate: Option<Invalidation>,
    pub retried: bool,
}

/// Next step after a response (first attempt or replay) came back.
#[derive(Debug, PartialEq, Eq)]
pub enum AfterResponse {
    /// Await the shared refresh, then feed its result to `on_refresh`
    Refresh(AwaitingRefresh),
    Settle(Settlement),
}

/// Next step after the awaited refresh resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum AfterRefresh {
    /// Send the identical request again and feed the reply to `on_response`
    Reissue(Attempt),
    Settle(Settlement),
}

/// A call with a request in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    request_id: String,
    retried: bool,
}

impl Attempt {
    pub fn new() -> Self {
        Self {
            request_id: format!("req_{}", Uuid::new_v4().as_simple()),
            retried: false,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Classify the response to the request in flight.
    ///
    /// A 401 always settles and invalidates, on the replay too. A 410
    /// asks for a refresh only if this call has not been replayed yet.
    pub fn on_response(self, outcome: Outcome) -> AfterResponse {
        match outcome.failure_kind() {
            Some(FailureKind::Unauthorized) => {
                AfterResponse::Settle(self.settle(outcome, Some(Invalidation::Unauthorized)))
            }
            Some(FailureKind::Expired) if !self.retried => {
                AfterResponse::Refresh(AwaitingRefresh {
                    attempt: Attempt {
                        retried: true,
                        ..self
                    },
                })
            }
            // Success, Network/Server/Client, or an expiry on the replay
            _ => AfterResponse::Settle(self.settle(outcome, None)),
        }
    }

    fn settle(self, outcome: Outcome, invalidate: Option<Invalidation>) -> Settlement {
        Settlement {
            outcome,
            invalidate,
            retried: self.retried,
        }
    }
}

impl Default for Attempt {
    fn default() -> Self {
        Self::new()
    }
}

/// A call whose first request expired, parked on the shared refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitingRefresh {
    attempt: Attempt,
}

impl AwaitingRefresh {
    pub fn request_id(&self) -> &str {
        self.attempt.request_id()
    }

    pub fn on_refresh(self, result: Result<(), RefreshError>) -> AfterRefresh {
        match result {
            Ok(()) => AfterRefresh::Reissue(self.attempt),
            Err(e) => AfterRefresh::Settle(self.attempt.settle(
                Outcome::failure(FailureKind::Expired, e.message()),
                Some(Invalidation::RefreshFailed),
            )),
        }
    }
}
