//! Error definitions
//!
//! The rendezvous core has no failure modes of its own: a rendezvous that
//! never happens simply never settles. These errors come from the
//! test-facing conveniences layered on top.

use thiserror::Error;

/// Main error type for ircmock
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No client is registered under the identity
    #[error("no mock client registered for {nickname}@{address}")]
    UnknownClient {
        /// Server address.
        address: String,
        /// Nickname.
        nickname: String,
    },

    /// The event bus was reset while a subscription was reading from it
    #[error("event bus subscription closed")]
    Closed,

    /// Assertion failed
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),
}

impl Error {
    /// Create an unknown client error.
    #[must_use]
    pub fn unknown_client(address: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self::UnknownClient {
            address: address.into(),
            nickname: nickname.into(),
        }
    }

    /// Create an assertion failure.
    #[must_use]
    pub fn assertion_failed(message: impl Into<String>) -> Self {
        Self::AssertionFailed(message.into())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
