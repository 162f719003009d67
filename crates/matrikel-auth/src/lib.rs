//! Authentication backends for Matrikel
//!
//! - [`DirectoryAuthenticator`]: username/password against an LDAP directory
//! - [`DelegatedAuthenticator`]: OAuth2 authorization code against a
//!   GitLab-style collaboration platform whose accounts are linked to the
//!   directory

pub mod directory;
pub mod oauth;

pub use directory::{
    DirectoryAuthenticator, DirectoryConnector, DirectoryEntry, DirectorySession,
    Ldap3Connector, SessionError, UserQuery,
};
pub use oauth::{
    generate_state, DelegatedAuthenticator, ExternalIdentity, ExternalIdentityParser,
    PlatformUser,
};

pub use matrikel_core::{Authenticator, DelegatedError, DirectoryError, Student};
