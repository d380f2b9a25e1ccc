//! Bookstore account endpoints
//!
//! Paths are relative to the configured API base URL. The credential itself is
//! a cookie set by the backend on login and refresh; none of these calls read
//! or write it directly.

/// Establishes the initial credential
pub const LOGIN_PATH: &str = "/v1/users/login";

/// Renews an expired credential. The only call a `CredentialRefresher` makes.
pub const REFRESH_PATH: &str = "/v1/users/refresh-token";

/// Ends the session server-side. Called by sign-out handling, never by the
/// request core.
pub const LOGOUT_PATH: &str = "/v1/users/logout";
