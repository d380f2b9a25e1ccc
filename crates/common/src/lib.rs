//! Shared types for the bookstore client workspace

mod error;
mod password;

pub use error::{Error, Result};
pub use password::Password;
