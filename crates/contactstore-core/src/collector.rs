//! Deduplicating contact collection.
//!
//! Raw output is turned into a lazy, finite stream of contacts that is
//! unique by email address. The first occurrence of an address wins; later
//! lines for the same address are dropped.

use std::collections::HashSet;

use crate::contact::{Contact, parse_line};

/// Diagnostic lines appended to real output in test mode.
///
/// Together they exercise: an address with an empty detail, a duplicate
/// address with differing detail, a line with no address at all, and a line
/// whose address field is empty.
pub const TEST_LINES: [&str; 5] = [
    "nic@one,",
    "nic@woomeduplicate.com,nic",
    "nic@woomeduplicate.com,nicholas",
    "asadlkqjcbqjbk",
    ",blah",
];

/// Splits raw program output into lines, appending [`TEST_LINES`] when
/// `test_mode` is set.
pub fn contact_lines(raw: &str, test_mode: bool) -> impl Iterator<Item = &str> {
    let fixture: &[&str] = if test_mode { &TEST_LINES } else { &[] };
    raw.lines().chain(fixture.iter().copied())
}

/// Iterator yielding each address at most once, in first-seen order.
#[derive(Debug)]
pub struct UniqueContacts<I> {
    lines: I,
    seen: HashSet<String>,
}

impl<'a, I> Iterator for UniqueContacts<I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = Contact;

    fn next(&mut self) -> Option<Contact> {
        for line in self.lines.by_ref() {
            let Some(contact) = parse_line(line) else {
                continue;
            };
            if self.seen.insert(contact.email.clone()) {
                return Some(contact);
            }
        }
        None
    }
}

/// Wraps a sequence of raw lines in a deduplicating contact stream.
pub fn unique_contacts<'a, I>(lines: I) -> UniqueContacts<I::IntoIter>
where
    I: IntoIterator<Item = &'a str>,
{
    UniqueContacts {
        lines: lines.into_iter(),
        seen: HashSet::new(),
    }
}
