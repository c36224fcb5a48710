//! Login credentials for a single import.

use std::fmt;

/// Address suffix rewritten to its canonical Gmail form.
const GOOGLEMAIL_SUFFIX: &str = "@googlemail.com";
const GMAIL_SUFFIX: &str = "@gmail.com";

/// An (email, password) pair, held for the duration of one import.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Normalised email address.
    pub email: String,
    /// Webmail password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials, normalising the address.
    ///
    /// Surrounding whitespace is trimmed and `@googlemail.com` addresses are
    /// rewritten to `@gmail.com`.
    #[must_use]
    pub fn new(email: &str, password: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn normalize_email(email: &str) -> String {
    let email = email.trim();
    email.strip_suffix(GOOGLEMAIL_SUFFIX).map_or_else(
        || email.to_string(),
        |local| format!("{local}{GMAIL_SUFFIX}"),
    )
}
