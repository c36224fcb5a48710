//! Webmail provider resolution.
//!
//! The provider is guessed from the domain label: the part of the address
//! immediately after `@` and before the first dot.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

#[allow(clippy::unwrap_used)] // Pattern is a literal
static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@(?P<label>[^.]+)\.").unwrap());

/// A webmail service the retrieval program can import from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Mail. Also the fallback for unrecognised domains.
    #[default]
    Gmail,
    /// Yahoo! Mail.
    Yahoo,
    /// Hotmail / Windows Live.
    Hotmail,
    /// MSN.
    Msn,
    /// AOL Mail.
    Aol,
    /// Plaxo.
    Plaxo,
    /// Lycos Mail.
    Lycos,
}

impl ProviderId {
    /// All providers, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Gmail,
        Self::Yahoo,
        Self::Hotmail,
        Self::Msn,
        Self::Aol,
        Self::Plaxo,
        Self::Lycos,
    ];

    /// Identifier handed to the retrieval program.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Yahoo => "yahoo",
            Self::Hotmail => "hotmail",
            Self::Msn => "msn",
            Self::Aol => "aol",
            Self::Plaxo => "plaxo",
            Self::Lycos => "lycos",
        }
    }

    /// Maps a domain label to a provider, if it is a known one.
    ///
    /// Matching is case-insensitive; aliases such as `googlemail` and
    /// `live` map onto their canonical provider.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "googlemail" | "gmail" => Some(Self::Gmail),
            "yahoo" => Some(Self::Yahoo),
            "hotmail" | "live" => Some(Self::Hotmail),
            "msn" => Some(Self::Msn),
            "aol" => Some(Self::Aol),
            "plaxo" => Some(Self::Plaxo),
            "lycos" => Some(Self::Lycos),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedProvider(s.to_string()))
    }
}

/// How unrecognised domain labels are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPolicy {
    /// Unknown labels fall back to [`ProviderId::default`].
    #[default]
    Permissive,
    /// Unknown labels are rejected with [`Error::UnsupportedProvider`].
    Strict,
}

/// Extracts the domain label from an address.
///
/// Returns `None` when the address lacks the `local@label.rest` shape.
///
/// ```ignore
/// assert_eq!(domain_label("user@mail.yahoo.co.uk"), Some("mail"));
/// assert_eq!(domain_label("user@yahoo.co.uk"), Some("yahoo"));
/// ```
#[must_use]
pub fn domain_label(email: &str) -> Option<&str> {
    DOMAIN_RE
        .captures(email)
        .and_then(|caps| caps.name("label"))
        .map(|m| m.as_str())
}

/// Resolves the provider for an address under the permissive policy.
///
/// Returns `None` only when no domain label can be extracted.
#[must_use]
pub fn resolve(email: &str) -> Option<ProviderId> {
    domain_label(email).map(|label| ProviderId::from_label(label).unwrap_or_default())
}

/// Resolves the provider for an address under the given policy.
///
/// `Ok(None)` means the address has no domain label at all, and no import
/// should be attempted.
///
/// # Errors
///
/// Returns [`Error::UnsupportedProvider`] under [`ProviderPolicy::Strict`]
/// when the label is not a known provider.
pub fn resolve_with(email: &str, policy: ProviderPolicy) -> Result<Option<ProviderId>> {
    let Some(label) = domain_label(email) else {
        debug!("No domain label in {email}");
        return Ok(None);
    };

    let provider = match (ProviderId::from_label(label), policy) {
        (Some(provider), _) => provider,
        (None, ProviderPolicy::Permissive) => ProviderId::default(),
        (None, ProviderPolicy::Strict) => {
            return Err(Error::UnsupportedProvider(label.to_string()));
        }
    };

    debug!("Resolved domain label {label} to provider {provider}");
    Ok(Some(provider))
}
