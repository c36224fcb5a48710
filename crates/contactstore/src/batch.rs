//! Batch test credentials.
//!
//! Batch mode looks for credentials in `contactstore_tests.json` in the
//! working directory first, then in the file named by `INVITEDEFS`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Definitions file looked up in the current directory.
pub const TESTS_FILE: &str = "contactstore_tests.json";

/// Environment variable naming a plain-text definitions file.
pub const DEFS_ENV: &str = "INVITEDEFS";

/// One set of credentials to import with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    /// Webmail address.
    pub username: String,
    /// Webmail password.
    pub password: String,
}

/// Loads batch test cases from the first available source.
///
/// Returns an empty list when neither source exists.
///
/// # Errors
///
/// Returns an error if a source exists but cannot be read or parsed.
pub fn load_tests() -> Result<Vec<TestCase>> {
    let local = Path::new(TESTS_FILE);
    if local.exists() {
        let contents = std::fs::read_to_string(local)
            .with_context(|| format!("reading {TESTS_FILE}"))?;
        return serde_json::from_str(&contents)
            .with_context(|| format!("parsing {TESTS_FILE}"));
    }

    let Ok(defs) = std::env::var(DEFS_ENV) else {
        return Ok(Vec::new());
    };
    let path = expand_path(&defs);
    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_defs(&contents))
}

/// Parses `email password` lines; blank lines and lines without a
/// password are skipped.
#[must_use]
pub fn parse_defs(contents: &str) -> Vec<TestCase> {
    contents
        .lines()
        .filter_map(|line| {
            let (username, password) = line.trim().split_once(' ')?;
            Some(TestCase {
                username: username.to_string(),
                password: password.trim().to_string(),
            })
        })
        .filter(|case| !case.username.is_empty() && !case.password.is_empty())
        .collect()
}

/// Expands a leading `~` and `$VAR` / `${VAR}` references.
///
/// Unset variables are left as written.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    let expanded = expand_vars(raw);
    match expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => dirs::home_dir().map_or_else(
            || PathBuf::from(&expanded),
            |home| home.join(rest.trim_start_matches('/')),
        ),
        _ => PathBuf::from(expanded),
    }
}

fn expand_vars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        let value = if name.is_empty() { None } else { std::env::var(name).ok() };
        match value {
            Some(value) => out.push_str(&value),
            None => {
                out.push('$');
                out.push_str(&after[..consumed]);
            }
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defs() {
        let cases = parse_defs(
            "yahoo@yahoo.com somepassword\n\nhotmail@hotmail.com  other\nlonely@aol.com\n",
        );
        assert_eq!(
            cases,
            vec![
                TestCase {
                    username: "yahoo@yahoo.com".to_string(),
                    password: "somepassword".to_string(),
                },
                TestCase {
                    username: "hotmail@hotmail.com".to_string(),
                    password: "other".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_tests_file_format() {
        let json = r#"[{"username": "gmail@gmail.com", "password": "pw"}]"#;
        let cases: Vec<TestCase> = serde_json::from_str(json).unwrap();
        assert_eq!(cases[0].username, "gmail@gmail.com");
        assert_eq!(cases[0].password, "pw");
    }

    #[test]
    fn test_expand_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_path("~/.mytestemails"), home.join(".mytestemails"));
        assert_eq!(expand_path("~"), home);
    }

    #[test]
    fn test_expand_leaves_plain_paths() {
        assert_eq!(expand_path("/tmp/defs"), PathBuf::from("/tmp/defs"));
        assert_eq!(expand_path("~user/defs"), PathBuf::from("~user/defs"));
    }

    #[test]
    fn test_expand_vars() {
        let Ok(path) = std::env::var("PATH") else {
            return;
        };
        assert_eq!(expand_vars("$PATH/x"), format!("{path}/x"));
        assert_eq!(expand_vars("${PATH}x"), format!("{path}x"));
    }

    #[test]
    fn test_expand_unset_vars_untouched() {
        assert_eq!(
            expand_vars("$CONTACTSTORE_SURELY_UNSET_VAR/x"),
            "$CONTACTSTORE_SURELY_UNSET_VAR/x"
        );
        assert_eq!(
            expand_vars("${CONTACTSTORE_SURELY_UNSET_VAR}"),
            "${CONTACTSTORE_SURELY_UNSET_VAR}"
        );
        assert_eq!(expand_vars("cost$"), "cost$");
        assert_eq!(expand_vars("${unterminated"), "${unterminated");
    }
}
