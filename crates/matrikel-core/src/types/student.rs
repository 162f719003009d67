//! Normalized identity record

use serde::{Deserialize, Serialize};

/// Identity of an authenticated person, independent of the backend that
/// produced it.
///
/// `Default` yields the zero value (every field empty). Only the delegated
/// path guarantees non-empty fields; a directory entry is mapped as found, so
/// one lacking the configured attributes yields empty fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Stable identifier within the source directory
    pub id: String,

    pub forename: String,

    pub surname: String,

    pub email: String,
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        forename: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            forename: forename.into(),
            surname: surname.into(),
            email: email.into(),
        }
    }

    /// True for the zero value
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
            && self.forename.is_empty()
            && self.surname.is_empty()
            && self.email.is_empty()
    }

    /// "Forename Surname", skipping whichever part is missing
    pub fn display_name(&self) -> String {
        match (self.forename.is_empty(), self.surname.is_empty()) {
            (false, false) => format!("{} {}", self.forename, self.surname),
            (false, true) => self.forename.clone(),
            (true, false) => self.surname.clone(),
            (true, true) => String::new(),
        }
    }
}
