//! reqwest-backed transport
//!
//! Joins each request's target onto the configured base URL, applies the
//! per-request timeout, and keeps cookies between calls. The backend's
//! credential lives in that cookie jar; this module never reads it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::{RawResponse, Request, Result, Transport, TransportError};

/// HTTP transport with a shared cookie store.
///
/// Cloning the underlying `reqwest::Client` shares its cookie jar, so a login
/// performed through one clone authenticates requests sent through another.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with a fresh cookie-enabled client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    /// Wrap an existing client. The caller decides whether it keeps cookies.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for a target path.
    pub fn url_for(&self, target: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }

    fn send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(format!(
                "no response within {}ms",
                self.timeout.as_millis()
            ))
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

impl Transport for HttpTransport {
    fn execute<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url_for(&request.target);

            let mut builder = self
                .client
                .request(request.method.clone(), &url)
                .headers(request.headers.clone())
                .timeout(self.timeout);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| self.send_error(e))?;
            let status = response.status().as_u16();

            // The timeout covers the body read too
            let body = response.text().await.map_err(|e| {
                if e.is_timeout() {
                    self.send_error(e)
                } else {
                    TransportError::Body(e.to_string())
                }
            })?;

            debug!(method = %request.method, target = %request.target, status, "round trip complete");
            Ok(RawResponse { status, body })
        })
    }
}
