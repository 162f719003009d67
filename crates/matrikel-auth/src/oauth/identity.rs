//! External identity parsing
//!
//! Platform accounts linked to the directory carry the directory entry's
//! identifier, e.g. `cn=lovelace\,ada(ab123),ou=people,dc=example,dc=edu`.
//! A pattern with the named groups `surname`, `forename` and `id` pulls the
//! person out of it.

use matrikel_core::config::default_identity_pattern;
use matrikel_core::{ConfigError, Student};
use regex::Regex;

const REQUIRED_GROUPS: [&str; 3] = ["surname", "forename", "id"];

/// Fields extracted from an external identity, trimmed but not yet
/// title-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub surname: String,
    pub forename: String,
    pub id: String,
}

impl ExternalIdentity {
    /// Build the normalized record. Names are title-cased, the id is taken
    /// verbatim.
    pub fn into_student(self, email: impl Into<String>) -> Student {
        Student::new(
            self.id,
            title_case(&self.forename),
            title_case(&self.surname),
            email,
        )
    }
}

/// Compiled external identity pattern
#[derive(Debug, Clone)]
pub struct ExternalIdentityParser {
    pattern: Regex,
}

impl ExternalIdentityParser {
    /// Parser for `cn=<surname>\,<forename>(<id>)`
    pub fn with_default_pattern() -> Result<Self, ConfigError> {
        Self::new(&default_identity_pattern())
    }

    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ConfigError::invalid("platform.identity_pattern", e.to_string()))?;

        for group in REQUIRED_GROUPS {
            if !pattern.capture_names().flatten().any(|name| name == group) {
                return Err(ConfigError::invalid(
                    "platform.identity_pattern",
                    format!("missing named group: {}", group),
                ));
            }
        }

        Ok(Self { pattern })
    }

    /// Extract the three fields. `None` when the pattern does not match or a
    /// field is blank after trimming.
    pub fn parse(&self, extern_uid: &str) -> Option<ExternalIdentity> {
        let captures = self.pattern.captures(extern_uid)?;

        let field = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Some(ExternalIdentity {
            surname: field("surname")?,
            forename: field("forename")?,
            id: field("id")?,
        })
    }
}

/// Upper-case the first letter of every word. Letters inside a word keep
/// their case.
///
/// ASCII characters other than letters, digits and `_` separate words, as
/// does any whitespace.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }

        at_word_start = if c.is_ascii() {
            !(c.is_ascii_alphanumeric() || c == '_')
        } else {
            c.is_whitespace()
        };
    }

    out
}
