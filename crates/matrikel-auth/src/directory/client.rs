//! Directory authenticator
//!
//! One authentication is one connection: connect, bind as the user, search
//! for the account, map the first entry, unbind. Every failure is reported
//! as a [`DirectoryError`].

use super::session::{DirectoryConnector, DirectorySession, Ldap3Connector};
use super::types::{classify_bind, UserQuery};
use async_trait::async_trait;
use matrikel_core::config::DirectoryConfig;
use matrikel_core::{Authenticator, ConfigError, DirectoryError, PasswordCredentials, Student};
use tracing::{debug, info, warn};

/// Authenticates username/password pairs against a directory server
pub struct DirectoryAuthenticator<C = Ldap3Connector> {
    config: DirectoryConfig,
    connector: C,
}

impl DirectoryAuthenticator {
    /// Create an authenticator talking LDAP to `config.server_url`
    pub fn new(config: DirectoryConfig) -> Result<Self, ConfigError> {
        let connector = Ldap3Connector::from_config(&config);
        Self::with_connector(config, connector)
    }
}

impl<C: DirectoryConnector> DirectoryAuthenticator<C> {
    /// Create an authenticator using a custom connector
    pub fn with_connector(config: DirectoryConfig, connector: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, connector })
    }

    /// Authenticate a user with username and password
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Student, DirectoryError> {
        // An empty password turns a simple bind into an unauthenticated bind,
        // which most servers accept.
        if password.is_empty() {
            warn!("Rejecting empty password for user: {}", username);
            return Err(DirectoryError::InvalidCredentials);
        }

        let mut session = self.connector.connect().await.map_err(|e| {
            warn!("Failed to connect to directory: {}", e);
            DirectoryError::ConnectionFailed
        })?;

        let outcome = self.bind_and_lookup(&mut session, username, password).await;
        session.close().await;

        match &outcome {
            Ok(student) => info!("Directory authentication succeeded for: {}", student.id),
            Err(e) => warn!("Directory authentication failed for {}: {}", username, e.code()),
        }

        outcome
    }

    async fn bind_and_lookup(
        &self,
        session: &mut C::Session,
        username: &str,
        password: &str,
    ) -> Result<Student, DirectoryError> {
        let principal = self.config.build_principal(username);
        debug!("Binding as: {}", principal);

        let rc = session.bind(&principal, password).await.map_err(|e| {
            debug!("Bind failed: {}", e);
            DirectoryError::UnknownError
        })?;

        if let Err(kind) = classify_bind(rc) {
            debug!("Bind rejected with code: {}", rc);
            return Err(kind);
        }

        let query = UserQuery::for_username(&self.config, username);
        let entries = session.search(&query).await.map_err(|e| {
            debug!("User search failed: {}", e);
            DirectoryError::NetworkError
        })?;

        let mut entries = entries.into_iter();
        let entry = entries.next().ok_or(DirectoryError::UserNotFound)?;

        let ignored = entries.count();
        if ignored > 0 {
            warn!(
                "Filter {} matched {} entries, using {}",
                query.filter,
                ignored + 1,
                entry.dn
            );
        }

        debug!("Found user DN: {}", entry.dn);
        Ok(entry.to_student(&self.config.attributes))
    }
}

#[async_trait]
impl<C: DirectoryConnector> Authenticator for DirectoryAuthenticator<C> {
    type Credentials = PasswordCredentials;
    type Error = DirectoryError;

    async fn authenticate(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<Student, DirectoryError> {
        DirectoryAuthenticator::<C>::authenticate(self, &credentials.username, &credentials.password)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::session::SessionError;
    use crate::directory::types::{DirectoryEntry, LDAP_INVALID_CREDENTIALS, LDAP_SUCCESS};
    use std::sync::{Arc, Mutex};

    /// What the fake server saw
    #[derive(Default)]
    struct Recorded {
        connects: usize,
        binds: Vec<(String, String)>,
        queries: Vec<UserQuery>,
        closes: usize,
    }

    /// In-memory directory with scripted answers
    #[derive(Clone)]
    struct FakeDirectory {
        reachable: bool,
        /// `None` simulates a transport failure during bind
        bind_rc: Option<u32>,
        /// `None` simulates a transport failure during search
        entries: Option<Vec<DirectoryEntry>>,
        recorded: Arc<Mutex<Recorded>>,
    }

    impl FakeDirectory {
        fn new() -> Self {
            Self {
                reachable: true,
                bind_rc: Some(LDAP_SUCCESS),
                entries: Some(vec![ada()]),
                recorded: Arc::new(Mutex::new(Recorded::default())),
            }
        }
    }

    struct FakeSession {
        directory: FakeDirectory,
    }

    #[async_trait]
    impl DirectoryConnector for FakeDirectory {
        type Session = FakeSession;

        async fn connect(&self) -> Result<FakeSession, SessionError> {
            self.recorded.lock().unwrap().connects += 1;
            if !self.reachable {
                return Err(SessionError("connection refused".to_string()));
            }
            Ok(FakeSession {
                directory: self.clone(),
            })
        }
    }

    #[async_trait]
    impl DirectorySession for FakeSession {
        async fn bind(&mut self, principal: &str, password: &str) -> Result<u32, SessionError> {
            self.directory
                .recorded
                .lock()
                .unwrap()
                .binds
                .push((principal.to_string(), password.to_string()));
            self.directory
                .bind_rc
                .ok_or_else(|| SessionError("connection reset".to_string()))
        }

        async fn search(&mut self, query: &UserQuery) -> Result<Vec<DirectoryEntry>, SessionError> {
            self.directory
                .recorded
                .lock()
                .unwrap()
                .queries
                .push(query.clone());
            self.directory
                .entries
                .clone()
                .ok_or_else(|| SessionError("connection reset".to_string()))
        }

        async fn close(&mut self) {
            self.directory.recorded.lock().unwrap().closes += 1;
        }
    }

    fn ada() -> DirectoryEntry {
        DirectoryEntry::new("CN=ab123,OU=IDMUsers,DC=AD,DC=example,DC=edu")
            .with_attr("sAMAccountName", "ab123")
            .with_attr("givenName", "Ada")
            .with_attr("sn", "Lovelace")
            .with_attr("mail", "ada@x.edu")
    }

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            server_url: "ldaps://ldaps.ad.example.edu".to_string(),
            user_domain: "ad.example.edu".to_string(),
            search_base: "ou=IDMUsers,DC=AD,DC=example,DC=edu".to_string(),
            ..Default::default()
        }
    }

    fn authenticator(directory: &FakeDirectory) -> DirectoryAuthenticator<FakeDirectory> {
        DirectoryAuthenticator::with_connector(config(), directory.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_successful_authentication() {
        let directory = FakeDirectory::new();
        let auth = authenticator(&directory);

        let student = auth.authenticate("ab123", "secret").await.unwrap();
        assert_eq!(student, Student::new("ab123", "Ada", "Lovelace", "ada@x.edu"));

        let recorded = directory.recorded.lock().unwrap();
        assert_eq!(
            recorded.binds,
            vec![("ab123@ad.example.edu".to_string(), "secret".to_string())]
        );
        assert_eq!(recorded.queries.len(), 1);
        assert_eq!(recorded.queries[0].filter, "(sAMAccountName=ab123)");
        assert_eq!(recorded.queries[0].base, "ou=IDMUsers,DC=AD,DC=example,DC=edu");
        assert_eq!(recorded.closes, 1);
    }

    #[tokio::test]
    async fn test_entry_without_attributes_maps_to_empty_student() {
        let directory = FakeDirectory {
            entries: Some(vec![DirectoryEntry::new("CN=ghost,OU=IDMUsers,DC=AD,DC=example,DC=edu")]),
            ..FakeDirectory::new()
        };
        let auth = authenticator(&directory);

        let student = auth.authenticate("ghost", "secret").await.unwrap();
        assert!(student.is_empty());
        assert_eq!(directory.recorded.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let directory = FakeDirectory {
            bind_rc: Some(LDAP_INVALID_CREDENTIALS),
            ..FakeDirectory::new()
        };
        let auth = authenticator(&directory);

        for (user, password) in [("groot", "iamgroot"), ("ab123", "wrong"), ("", "x")] {
            let err = auth.authenticate(user, password).await.unwrap_err();
            assert_eq!(err, DirectoryError::InvalidCredentials);
        }

        let recorded = directory.recorded.lock().unwrap();
        assert!(recorded.queries.is_empty());
        assert_eq!(recorded.closes, 3);
    }

    #[tokio::test]
    async fn test_empty_password_never_reaches_directory() {
        let directory = FakeDirectory::new();
        let auth = authenticator(&directory);

        let err = auth.authenticate("ab123", "").await.unwrap_err();
        assert_eq!(err, DirectoryError::InvalidCredentials);
        assert_eq!(directory.recorded.lock().unwrap().connects, 0);
    }

    #[tokio::test]
    async fn test_other_bind_failures_are_unknown() {
        // unwillingToPerform
        let directory = FakeDirectory {
            bind_rc: Some(53),
            ..FakeDirectory::new()
        };
        let err = authenticator(&directory)
            .authenticate("ab123", "secret")
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::UnknownError);
        assert_eq!(directory.recorded.lock().unwrap().closes, 1);

        let directory = FakeDirectory {
            bind_rc: None,
            ..FakeDirectory::new()
        };
        let err = authenticator(&directory)
            .authenticate("ab123", "secret")
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::UnknownError);
        assert_eq!(directory.recorded.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let directory = FakeDirectory {
            reachable: false,
            ..FakeDirectory::new()
        };

        let err = authenticator(&directory)
            .authenticate("ab123", "secret")
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::ConnectionFailed);

        let recorded = directory.recorded.lock().unwrap();
        assert!(recorded.binds.is_empty());
        assert_eq!(recorded.closes, 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_network_error() {
        let directory = FakeDirectory {
            entries: None,
            ..FakeDirectory::new()
        };

        let err = authenticator(&directory)
            .authenticate("ab123", "secret")
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::NetworkError);
        assert_eq!(directory.recorded.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_user_not_found() {
        let directory = FakeDirectory {
            entries: Some(Vec::new()),
            ..FakeDirectory::new()
        };

        let err = authenticator(&directory)
            .authenticate("ab123", "secret")
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::UserNotFound);
        assert_eq!(directory.recorded.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_first_entry_wins() {
        let other = DirectoryEntry::new("CN=ab123,OU=Alumni,DC=AD,DC=example,DC=edu")
            .with_attr("sAMAccountName", "ab123")
            .with_attr("givenName", "Augusta")
            .with_attr("sn", "King")
            .with_attr("mail", "augusta@x.edu");

        let directory = FakeDirectory {
            entries: Some(vec![ada(), other]),
            ..FakeDirectory::new()
        };

        let student = authenticator(&directory)
            .authenticate("ab123", "secret")
            .await
            .unwrap();
        assert_eq!(student.forename, "Ada");
    }

    #[tokio::test]
    async fn test_authenticator_trait() {
        let directory = FakeDirectory::new();
        let auth = authenticator(&directory);

        let credentials = PasswordCredentials::new("ab123", "secret");
        let student = Authenticator::authenticate(&auth, &credentials).await.unwrap();
        assert_eq!(student.id, "ab123");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DirectoryConfig {
            search_base: String::new(),
            ..config()
        };
        assert!(DirectoryAuthenticator::new(config).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let config = DirectoryConfig {
            // Nothing listens on the discard port
            server_url: "ldap://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..config()
        };

        let auth = DirectoryAuthenticator::new(config).unwrap();
        let err = auth.authenticate("groot", "iamgroot").await.unwrap_err();
        assert_eq!(err, DirectoryError::ConnectionFailed);
    }
}
