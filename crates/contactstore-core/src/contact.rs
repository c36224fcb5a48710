//! Contact model and raw output line parsing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::unwrap_used)] // Pattern is a literal
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^']+@[A-Za-z.-]+").unwrap());

/// A contact pulled from a webmail address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Email address (unique identifier within one import).
    pub email: String,
    /// Free-form detail, usually the display name (may be empty).
    pub detail: String,
}

impl Contact {
    /// Creates a new contact.
    #[must_use]
    pub fn new(email: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            detail: detail.into(),
        }
    }

    /// Returns a display string for the contact.
    ///
    /// If a detail is present, returns "Detail <email>", otherwise just "email".
    #[must_use]
    pub fn display(&self) -> String {
        if self.detail.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.detail, self.email)
        }
    }
}

/// Returns true if `candidate` has the minimal `local@domain` shape.
#[must_use]
pub fn is_email_shaped(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate)
}

/// Parses one raw output line of the form `email,detail,detail...`.
///
/// The first field must look like an address or the line is dropped. The
/// remaining fields are joined with single spaces to form the detail.
/// Malformed lines yield `None`; this never fails.
#[must_use]
pub fn parse_line(line: &str) -> Option<Contact> {
    let mut fields = line.split(',');
    let email = fields.next()?;
    if !is_email_shaped(email) {
        return None;
    }
    let detail = fields.collect::<Vec<_>>().join(" ");
    Some(Contact::new(email, detail))
}
