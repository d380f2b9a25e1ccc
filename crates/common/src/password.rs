//! Account password held only as long as the client needs it to sign in

use std::fmt;
use zeroize::Zeroize;

/// Account password. Never printed, wiped from memory on drop.
///
/// Read once from `BOOKSTORE_PASSWORD` or the configured password file and
/// sent once in the login body.
pub struct Password(String);

impl Password {
    /// Wrap a password, rejecting one that is empty after trimming.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let mut value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            value.zeroize();
            return None;
        }
        if trimmed.len() != value.len() {
            let owned = trimmed.to_owned();
            value.zeroize();
            value = owned;
        }
        Some(Self(value))
    }

    /// Plaintext for the login request body.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
