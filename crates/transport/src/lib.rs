//! Outbound request primitive for the bookstore API
//!
//! Defines the `Transport` trait that the session layer dispatches through, the
//! immutable `Request` value it sends, and the `RawResponse` it gets back. The
//! transport never interprets status codes: a 401 or a 500 is a successful
//! round trip as far as this crate is concerned. Only failures to complete the
//! round trip (timeouts, refused connections) are `TransportError`s.
//!
//! `HttpTransport` is the reqwest implementation. It keeps a cookie store, so
//! whatever credential cookie the backend sets on login or refresh is replayed
//! on every later request without the caller ever touching it.

pub mod http;

pub use http::HttpTransport;
pub use reqwest::Method;
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;

/// One logical API call: method, target path, optional JSON body and headers.
///
/// `target` is relative to the transport's base URL (e.g. `/v1/products`).
/// The value is never mutated by dispatching it, so the same `Request` can be
/// sent any number of times, concurrently or not.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, target).with_body(body)
    }

    pub fn put(target: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::PUT, target).with_body(body)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A completed round trip: status code and the body as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Error body shape returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// User-visible failure text.
    ///
    /// Uses `message` from a `{ "message": ... }` body verbatim. Falls back to
    /// the raw body, then to the bare status when the body is empty.
    pub fn error_message(&self) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&self.body) {
            return parsed.message;
        }
        let trimmed = self.body.trim();
        if trimmed.is_empty() {
            format!("request failed with status {}", self.status)
        } else {
            trimmed.to_string()
        }
    }
}

/// Failures to complete a round trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Abstraction over "send this request, give me the status and body".
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>`), so the session layer and tests can swap the
/// reqwest client for a scripted fake.
pub trait Transport: Send + Sync {
    /// Perform one round trip. Implementations must bound the duration of the
    /// call and report an overrun as `TransportError::Timeout`.
    fn execute<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;
}
