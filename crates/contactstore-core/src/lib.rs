//! # contactstore-core
//!
//! Contact-retrieval engine for importing a user's webmail address book.
//!
//! This crate provides:
//! - **Provider resolution** - maps an address's domain label to a webmail provider
//! - **Retrieval** - runs the external per-provider import program and classifies failures
//! - **Line parsing** - turns raw `email,detail...` output lines into contacts
//! - **Deduplication** - unique-by-email, first-seen-wins contact streams
//! - **Import orchestration** - the [`Importer`] entry point tying it together
//!
//! ## Example
//!
//! ```ignore
//! use contactstore_core::{Importer, ImporterConfig};
//!
//! let importer = Importer::from_config(&ImporterConfig::load_default()?);
//! for contact in importer.get_contacts("me@yahoo.com", "secret", false).await? {
//!     println!("{}", contact.display());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod collector;
pub mod config;
pub mod contact;
pub mod credentials;
mod error;
pub mod import;
pub mod provider;
pub mod runner;

pub use collector::{TEST_LINES, UniqueContacts, contact_lines, unique_contacts};
pub use config::{ConfigError, ImporterConfig};
pub use contact::{Contact, parse_line};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use import::{Importer, get_contacts};
pub use provider::{ProviderId, ProviderPolicy, domain_label, resolve, resolve_with};
pub use runner::{ProcessOutput, ProcessRunner, Retrieve, classify};
