//! Directory query and result types

use matrikel_core::config::{DirectoryAttributes, DirectoryConfig};
use matrikel_core::{DirectoryError, Student};
use std::collections::HashMap;

// ============================================================================
// Bind result codes
// ============================================================================

/// RFC 4511 `success`
pub const LDAP_SUCCESS: u32 = 0;

/// RFC 4511 `invalidCredentials`
pub const LDAP_INVALID_CREDENTIALS: u32 = 49;

/// Bind result codes with a dedicated error kind. Any other non-zero code is
/// an [`DirectoryError::UnknownError`].
const BIND_RESULT_KINDS: &[(u32, DirectoryError)] =
    &[(LDAP_INVALID_CREDENTIALS, DirectoryError::InvalidCredentials)];

/// Classify the result code of a simple bind
pub fn classify_bind(rc: u32) -> Result<(), DirectoryError> {
    if rc == LDAP_SUCCESS {
        return Ok(());
    }

    Err(BIND_RESULT_KINDS
        .iter()
        .find(|(code, _)| *code == rc)
        .map(|(_, kind)| *kind)
        .unwrap_or(DirectoryError::UnknownError))
}

// ============================================================================
// Search
// ============================================================================

/// Subtree search for one account.
///
/// Aliases are never dereferenced, no size or time limit is sent and full
/// attribute values are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub base: String,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl UserQuery {
    pub fn for_username(config: &DirectoryConfig, username: &str) -> Self {
        let escaped = ldap3::ldap_escape(username);

        Self {
            base: config.search_base.clone(),
            filter: config.build_user_filter(&escaped),
            attributes: config
                .attributes
                .as_vec()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One search result entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of an attribute, empty when absent. Attribute names are
    /// matched case-insensitively.
    pub fn first_value(&self, name: &str) -> &str {
        let values = self.attrs.get(name).or_else(|| {
            self.attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, values)| values)
        });

        values
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Map the entry onto a [`Student`]. Missing attributes stay empty.
    pub fn to_student(&self, attributes: &DirectoryAttributes) -> Student {
        Student::new(
            self.first_value(&attributes.id),
            self.first_value(&attributes.forename),
            self.first_value(&attributes.surname),
            self.first_value(&attributes.email),
        )
    }
}

impl From<ldap3::SearchEntry> for DirectoryEntry {
    fn from(entry: ldap3::SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attrs: entry.attrs,
        }
    }
}
