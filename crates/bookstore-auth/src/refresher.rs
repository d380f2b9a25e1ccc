//! Credential renewal
//!
//! A `CredentialRefresher` makes exactly one call to the renewal endpoint per
//! invocation. Success means the transport's cookie jar now holds a usable
//! credential. It never retries: single-flight and retry policy belong to the
//! session layer, which decides how often this gets called.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};
use transport::{Request, Transport};

use crate::constants::REFRESH_PATH;
use crate::error::RefreshError;

/// Obtains a fresh credential from the backend.
///
/// Uses `Pin<Box<dyn Future>>` for dyn-compatibility (`Arc<dyn CredentialRefresher>`).
/// The returned future is `'static` so it can be driven on its own task.
pub trait CredentialRefresher: Send + Sync {
    fn refresh(&self) -> Pin<Box<dyn Future<Output = Result<(), RefreshError>> + Send + 'static>>;
}

/// Refresher that calls `GET /v1/users/refresh-token` through a transport.
///
/// The transport must share its cookie store with the one the request
/// dispatcher uses, or the renewed credential will never be sent.
pub struct HttpCredentialRefresher {
    transport: Arc<dyn Transport>,
}

impl HttpCredentialRefresher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl CredentialRefresher for HttpCredentialRefresher {
    fn refresh(&self) -> Pin<Box<dyn Future<Output = Result<(), RefreshError>> + Send + 'static>> {
        let transport = Arc::clone(&self.transport);
        Box::pin(async move {
            let request = Request::get(REFRESH_PATH);
            let response = transport.execute(&request).await.map_err(|e| {
                warn!(error = %e, "refresh call did not complete");
                RefreshError::Transport(e.to_string())
            })?;

            if !response.is_success() {
                // 401/410/5xx all collapse here; the renewal is not retried
                let message = response.error_message();
                warn!(status = response.status, error = %message, "refresh rejected");
                return Err(RefreshError::Rejected {
                    status: response.status,
                    message,
                });
            }

            debug!(status = response.status, "credential renewed");
            Ok(())
        })
    }
}
