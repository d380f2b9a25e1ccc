//! Session layer metrics
//!
//! Recorded through the `metrics` facade. The library never installs a
//! recorder; without one these calls are no-ops.
//!
//! - `session_requests_total` (counter): label `outcome`
//! - `session_refresh_total` (counter): label `result`
//! - `session_refresh_joined_total` (counter)
//! - `session_invalidations_total` (counter): label `reason`
//! - `session_busy` (gauge)

use crate::attempt::Invalidation;
use crate::outcome::Outcome;

/// Record a settled dispatch.
pub fn record_request(outcome: &Outcome) {
    metrics::counter!("session_requests_total", "outcome" => outcome.label()).increment(1);
}

/// Record one actual refresher invocation and its result.
pub fn record_refresh(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("session_refresh_total", "result" => result).increment(1);
}

/// Record a caller that piggybacked on a refresh already in flight.
pub fn record_refresh_joined() {
    metrics::counter!("session_refresh_joined_total").increment(1);
}

/// Record a call to the session sink.
pub fn record_invalidation(reason: Invalidation) {
    metrics::counter!("session_invalidations_total", "reason" => reason.label()).increment(1);
}

/// A dispatch started. Applied as a delta so concurrent guards can't
/// publish a stale absolute value.
pub fn busy_entered() {
    metrics::gauge!("session_busy").increment(1.0);
}

/// A dispatch settled or was dropped.
pub fn busy_left() {
    metrics::gauge!("session_busy").decrement(1.0);
}
