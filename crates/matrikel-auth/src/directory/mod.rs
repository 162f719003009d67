//! LDAP/Active Directory authentication
//!
//! Binds as the user, looks the account up by its login name and maps the
//! first matching entry onto a [`matrikel_core::Student`].
//!
//! Only single-match directories are supported: when the filter matches
//! several entries the first one wins and a warning is logged.

mod client;
mod session;
mod types;

pub use client::DirectoryAuthenticator;
pub use session::{DirectoryConnector, DirectorySession, Ldap3Connector, Ldap3Session, SessionError};
pub use types::*;
