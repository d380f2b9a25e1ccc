//! Bookstore account library
//!
//! Endpoint constants, the credential refresher, and login/logout. This crate
//! knows nothing about retry policy or single-flight coordination; it only
//! performs individual account calls over a `transport::Transport`.
//!
//! Credential flow:
//! 1. Application calls `session::login()`; backend sets the credential cookie
//! 2. Requests flow through the session layer's dispatcher
//! 3. On expiry the dispatcher's coordinator calls `CredentialRefresher::refresh()`
//! 4. On unrecoverable failure the application calls `session::logout()`

pub mod constants;
pub mod error;
pub mod refresher;
pub mod session;

pub use constants::*;
pub use error::{Error, RefreshError, Result};
pub use refresher::{CredentialRefresher, HttpCredentialRefresher};
pub use session::{login, logout};
