//! Error types for account operations

/// Errors from login and logout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] transport::TransportError),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Result alias for account operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of the credential renewal call.
///
/// Every way the refresh can fail collapses into this one type; the caller
/// never retries a refresh, it only needs the message. `Clone` because a single
/// refresh result is handed to every request waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("credential refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("credential refresh failed: {0}")]
    Transport(String),

    #[error("credential refresh interrupted: {0}")]
    Interrupted(String),
}

impl RefreshError {
    /// Text suitable for showing to the user.
    pub fn message(&self) -> &str {
        match self {
            RefreshError::Rejected { message, .. } => message,
            RefreshError::Transport(message) | RefreshError::Interrupted(message) => message,
        }
    }
}
