//! Directory connections
//!
//! [`DirectoryConnector`] opens one [`DirectorySession`] per authentication.
//! The production implementation talks LDAP through `ldap3` and supports
//! LDAPS and STARTTLS.

use super::types::{DirectoryEntry, UserQuery};
use async_trait::async_trait;
use ldap3::{
    DerefAliases, Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry,
    SearchOptions,
};
use matrikel_core::config::DirectoryConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Transport or protocol failure reported by a session. Never leaves the
/// crate's public authenticate API; it is classified first.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SessionError(pub String);

impl From<LdapError> for SessionError {
    fn from(err: LdapError) -> Self {
        SessionError(err.to_string())
    }
}

/// Opens connections to a directory server
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    type Session: DirectorySession;

    async fn connect(&self) -> Result<Self::Session, SessionError>;
}

/// One open directory connection
#[async_trait]
pub trait DirectorySession: Send {
    /// Simple bind. Returns the LDAP result code; transport failures are
    /// errors.
    async fn bind(&mut self, principal: &str, password: &str) -> Result<u32, SessionError>;

    /// Run the search. A non-success result code is an error.
    async fn search(&mut self, query: &UserQuery) -> Result<Vec<DirectoryEntry>, SessionError>;

    /// Release the connection. Must be safe to call after any failure.
    async fn close(&mut self);
}

/// Parameters of the user lookup search
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchParams {
    pub scope: Scope,
    pub deref: DerefAliases,
    pub size_limit: i32,
    pub time_limit: i32,
    pub types_only: bool,
}

/// Whole subtree, aliases never dereferenced, no server-side limits, values
/// included
pub(crate) const USER_SEARCH: SearchParams = SearchParams {
    scope: Scope::Subtree,
    deref: DerefAliases::Never,
    size_limit: 0,
    time_limit: 0,
    types_only: false,
};

impl SearchParams {
    fn options(&self) -> SearchOptions {
        SearchOptions::new()
            .deref(self.deref)
            .sizelimit(self.size_limit)
            .timelimit(self.time_limit)
            .typesonly(self.types_only)
    }
}

// ============================================================================
// ldap3 implementation
// ============================================================================

/// Connector backed by `ldap3`
#[derive(Debug, Clone)]
pub struct Ldap3Connector {
    server_url: String,
    start_tls: bool,
    skip_tls_verify: bool,
    timeout: Duration,
}

impl Ldap3Connector {
    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self {
            server_url: config.server_url.clone(),
            start_tls: config.start_tls,
            skip_tls_verify: config.skip_tls_verify,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

#[async_trait]
impl DirectoryConnector for Ldap3Connector {
    type Session = Ldap3Session;

    async fn connect(&self) -> Result<Ldap3Session, SessionError> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout)
            .set_starttls(self.start_tls)
            .set_no_tls_verify(self.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.server_url);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.server_url).await?;
        ldap3::drive!(conn);

        Ok(Ldap3Session {
            ldap,
            timeout: self.timeout,
        })
    }
}

/// Session over an `ldap3` connection
pub struct Ldap3Session {
    ldap: Ldap,
    timeout: Duration,
}

#[async_trait]
impl DirectorySession for Ldap3Session {
    async fn bind(&mut self, principal: &str, password: &str) -> Result<u32, SessionError> {
        let result = self
            .ldap
            .with_timeout(self.timeout)
            .simple_bind(principal, password)
            .await?;

        Ok(result.rc)
    }

    async fn search(&mut self, query: &UserQuery) -> Result<Vec<DirectoryEntry>, SessionError> {
        debug!("Searching for user with filter: {}", query.filter);

        let (rs, _res) = self
            .ldap
            .with_search_options(USER_SEARCH.options())
            .with_timeout(self.timeout)
            .search(
                &query.base,
                USER_SEARCH.scope,
                &query.filter,
                query.attributes.clone(),
            )
            .await?
            .success()?;

        Ok(rs
            .into_iter()
            .map(|entry| DirectoryEntry::from(SearchEntry::construct(entry)))
            .collect())
    }

    async fn close(&mut self) {
        if let Err(e) = self.ldap.unbind().await {
            debug!("LDAP unbind failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_search_parameters() {
        assert_eq!(USER_SEARCH.scope, Scope::Subtree);
        assert_eq!(USER_SEARCH.deref, DerefAliases::Never);
        assert_eq!(USER_SEARCH.size_limit, 0);
        assert_eq!(USER_SEARCH.time_limit, 0);
        assert!(!USER_SEARCH.types_only);
    }

    #[test]
    fn test_connector_from_config() {
        let config = DirectoryConfig {
            server_url: "ldaps://ldap.example.edu:636".to_string(),
            start_tls: true,
            timeout_seconds: 3,
            ..Default::default()
        };

        let connector = Ldap3Connector::from_config(&config);
        assert_eq!(connector.server_url, "ldaps://ldap.example.edu:636");
        assert!(connector.start_tls);
        assert!(!connector.skip_tls_verify);
        assert_eq!(connector.timeout, Duration::from_secs(3));
    }
}
