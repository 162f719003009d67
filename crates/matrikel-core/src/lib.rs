//! Matrikel Core Library
//!
//! Shared identity record, authenticator contract, error taxonomy and
//! configuration for the Matrikel authentication backends.

pub mod authenticator;
pub mod config;
pub mod error;
pub mod types;

pub use authenticator::Authenticator;
pub use config::MatrikelConfig;
pub use error::{ConfigError, DelegatedError, DirectoryError, Error, Result};
pub use types::{AuthorizationCode, PasswordCredentials, Student};

/// Matrikel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
