//! Error types for contact imports.

use thiserror::Error;

/// Errors that can occur while importing an address book.
///
/// Classification happens once, where the external program's output is
/// inspected; callers receive these variants unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider rejected the supplied credentials.
    #[error("login error pid={pid} email={email}")]
    Authentication {
        /// Process id of the retrieval program that reported the failure.
        pid: u32,
        /// Address the login was attempted for.
        email: String,
    },

    /// The domain label does not map to a supported provider.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Retrieval failed for any other reason.
    #[error("retrieval error: {0}")]
    Retrieval(String),
}

impl Error {
    /// Creates a retrieval error from a message.
    #[must_use]
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Returns true if this is a failed login.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
