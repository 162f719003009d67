//! Delegated authenticator

use super::identity::ExternalIdentityParser;
use super::platform::PlatformClient;
use super::token::exchange_code;
use async_trait::async_trait;
use matrikel_core::config::{parse_http_url, OAuthConfig, PlatformConfig};
use matrikel_core::{Authenticator, AuthorizationCode, ConfigError, DelegatedError, Student};
use rand::distr::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const STATE_LENGTH: usize = 32;

/// Random anti-forgery token for [`DelegatedAuthenticator::generate_auth_url`]
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Authenticates users through an OAuth2 provider and the platform account
/// linked to their directory entry
pub struct DelegatedAuthenticator {
    oauth: OAuthConfig,
    platform: PlatformConfig,
    auth_url: Url,
    token_url: Url,
    parser: ExternalIdentityParser,
    http: Client,
}

impl DelegatedAuthenticator {
    pub fn new(oauth: OAuthConfig, platform: PlatformConfig) -> Result<Self, ConfigError> {
        oauth.validate()?;

        let auth_url = parse_http_url("oauth.auth_url", &oauth.auth_url)?;
        let token_url = parse_http_url("oauth.token_url", &oauth.token_url)?;
        let parser = ExternalIdentityParser::new(&platform.identity_pattern)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(platform.timeout_seconds))
            .build()
            .map_err(|e| ConfigError::invalid("http_client", e.to_string()))?;

        Ok(Self {
            oauth,
            platform,
            auth_url,
            token_url,
            parser,
            http,
        })
    }

    /// Authorization endpoint URL the user is redirected to. Requests
    /// offline access so the provider issues a refresh-capable grant.
    pub fn generate_auth_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("access_type", "offline");
            query.append_pair("client_id", &self.oauth.client_id);
            if let Some(redirect) = &self.oauth.redirect_url {
                query.append_pair("redirect_uri", redirect);
            }
            query.append_pair("response_type", "code");
            if !self.oauth.scopes.is_empty() {
                query.append_pair("scope", &self.oauth.scopes.join(" "));
            }
            if !state.is_empty() {
                query.append_pair("state", state);
            }
        }

        url.into()
    }

    /// Exchange `code` and resolve the linked directory identity
    pub async fn authenticate(&self, code: &str) -> Result<Student, DelegatedError> {
        if code.is_empty() {
            warn!("Rejecting empty authorization code");
            return Err(DelegatedError::TokenExchangeFailed);
        }

        let outcome = self.resolve(code).await;

        match &outcome {
            Ok(student) => info!("Delegated authentication succeeded for: {}", student.id),
            Err(e) => warn!("Delegated authentication failed: {}", e.code()),
        }

        outcome
    }

    async fn resolve(&self, code: &str) -> Result<Student, DelegatedError> {
        let token = exchange_code(&self.http, &self.oauth, &self.token_url, code).await?;

        let client = PlatformClient::new(&self.http, &self.platform.api_base_url, &token.access_token)?;
        let user = client.current_user().await?;

        let linked = user
            .identities
            .first()
            .ok_or(DelegatedError::NoExternalIdentities)?;

        debug!(
            "Using {} identity for platform user {}",
            linked.provider, user.username
        );

        let identity = self.parser.parse(&linked.extern_uid).ok_or_else(|| {
            warn!("Unexpected external identity format: {}", linked.extern_uid);
            DelegatedError::IdentityFormatInvalid
        })?;

        Ok(identity.into_student(user.email))
    }
}

#[async_trait]
impl Authenticator for DelegatedAuthenticator {
    type Credentials = AuthorizationCode;
    type Error = DelegatedError;

    async fn authenticate(&self, credentials: &AuthorizationCode) -> Result<Student, DelegatedError> {
        DelegatedAuthenticator::authenticate(self, credentials.as_str()).await
    }
}
