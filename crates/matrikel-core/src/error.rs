//! Error types for Matrikel
//!
//! Every failure of an authenticator is reported as one variant of a small,
//! closed enumeration. Library errors from the LDAP or HTTP stack are logged
//! and classified, they never reach the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the directory (LDAP) authenticator
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryError {
    #[error("connection failed")]
    ConnectionFailed,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unknown error")]
    UnknownError,

    #[error("network error")]
    NetworkError,

    #[error("user not found")]
    UserNotFound,
}

impl DirectoryError {
    pub fn code(&self) -> &'static str {
        match self {
            DirectoryError::ConnectionFailed => "ConnectionFailed",
            DirectoryError::InvalidCredentials => "InvalidCredentials",
            DirectoryError::UnknownError => "UnknownError",
            DirectoryError::NetworkError => "NetworkError",
            DirectoryError::UserNotFound => "UserNotFound",
        }
    }
}

/// Failures of the delegated (OAuth + platform) authenticator
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegatedError {
    #[error("token exchange failed")]
    TokenExchangeFailed,

    #[error("invalid base url")]
    InvalidUrl,

    #[error("accessing user api failed")]
    UserAccessFailed,

    #[error("no external identities")]
    NoExternalIdentities,

    #[error("external identity has an unexpected format")]
    IdentityFormatInvalid,
}

impl DelegatedError {
    pub fn code(&self) -> &'static str {
        match self {
            DelegatedError::TokenExchangeFailed => "TokenExchangeFailed",
            DelegatedError::InvalidUrl => "InvalidUrl",
            DelegatedError::UserAccessFailed => "UserAccessFailed",
            DelegatedError::NoExternalIdentities => "NoExternalIdentities",
            DelegatedError::IdentityFormatInvalid => "IdentityFormatInvalid",
        }
    }
}

/// Invalid or unreadable configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Delegated(#[from] DelegatedError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Directory(e) => e.code(),
            Error::Delegated(e) => e.code(),
            Error::Config(_) => "InvalidConfiguration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DirectoryError::InvalidCredentials.code(), "InvalidCredentials");
        assert_eq!(DirectoryError::UserNotFound.code(), "UserNotFound");
        assert_eq!(DelegatedError::IdentityFormatInvalid.code(), "IdentityFormatInvalid");
        assert_eq!(DelegatedError::NoExternalIdentities.code(), "NoExternalIdentities");
    }

    #[test]
    fn test_umbrella_error_forwards_code() {
        let err: Error = DirectoryError::NetworkError.into();
        assert_eq!(err.code(), "NetworkError");

        let err: Error = DelegatedError::InvalidUrl.into();
        assert_eq!(err.code(), "InvalidUrl");
        assert_eq!(err.to_string(), "invalid base url");

        let err: Error = ConfigError::Missing("client_id").into();
        assert_eq!(err.code(), "InvalidConfiguration");
    }
}
