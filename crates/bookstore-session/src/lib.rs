//! Resilient authenticated request layer for the bookstore API
//!
//! Wraps outbound calls so that an expired credential is renewed once, no
//! matter how many requests notice the expiry at the same time, and each of
//! those requests is replayed exactly once afterwards.
//!
//! Components:
//! - `RequestDispatcher`: sends requests, classifies failures, retries once
//! - `RefreshCoordinator`: single-flight owner of the credential refresh
//! - `SessionNotifier`: injected sink for "session is unrecoverable"
//! - `SignOutLatch`: notifier that turns many invalidations into one sign-out
//!
//! Request lifecycle:
//! 1. Caller hands a `Request` to `RequestDispatcher::send()`
//! 2. 2xx → `Outcome::Success`
//! 3. 401 (first attempt or replay) → `SessionNotifier::invalidate()`, `Failure(Unauthorized)`
//! 4. 410 → `RefreshCoordinator::ensure_fresh()`, then one replay
//! 5. Refresh failure → `invalidate()`, `Failure(Expired)`
//! 6. Anything else → returned to the caller as-is

pub mod attempt;
pub mod busy;
pub mod coordinator;
pub mod dispatcher;
pub mod metrics;
pub mod notifier;
pub mod outcome;

pub use attempt::{AfterRefresh, AfterResponse, Attempt, AwaitingRefresh, Invalidation, Settlement};
pub use bookstore_auth::{CredentialRefresher, RefreshError};
pub use busy::{BusyCounter, BusyGuard};
pub use coordinator::RefreshCoordinator;
pub use dispatcher::RequestDispatcher;
pub use notifier::{SessionNotifier, SignOutLatch};
pub use outcome::{FailureKind, Outcome, classify_status};
pub use transport::Request;
