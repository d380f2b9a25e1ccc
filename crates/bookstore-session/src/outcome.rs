//! Outcome classification for dispatched requests
//!
//! Maps the backend's status codes onto the failure kinds the dispatcher acts
//! on. Only `Unauthorized` and `Expired` change what the dispatcher does; the
//! rest are handed back to the caller untouched.

use transport::{RawResponse, TransportError};

/// Why a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// 401: session is gone, must sign in again
    Unauthorized,
    /// 410: credential timed out but can be renewed
    Expired,
    /// Transport error or timeout
    Network,
    /// 5xx
    Server,
    /// Any other non-2xx
    Client,
}

impl FailureKind {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Expired => "expired",
            FailureKind::Network => "network",
            FailureKind::Server => "server",
            FailureKind::Client => "client",
        }
    }
}

/// Classify an HTTP status. `None` means success.
pub fn classify_status(status: u16) -> Option<FailureKind> {
    match status {
        200..=299 => None,
        401 => Some(FailureKind::Unauthorized),
        410 => Some(FailureKind::Expired),
        500..=599 => Some(FailureKind::Server),
        _ => Some(FailureKind::Client),
    }
}

/// Result of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl Outcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Outcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn from_response(response: RawResponse) -> Self {
        match classify_status(response.status) {
            None => Outcome::Success(response.body),
            Some(kind) => Outcome::failure(kind, response.error_message()),
        }
    }

    pub fn from_transport_error(error: &TransportError) -> Self {
        Outcome::failure(FailureKind::Network, error.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Label for logs and metrics: `success` or the failure kind.
    pub fn label(&self) -> &'static str {
        self.failure_kind().map_or("success", |kind| kind.label())
    }
}
