//! Configuration for Matrikel
//!
//! Endpoints, DNs, filters and patterns are all configuration so that one
//! build can serve several deployments (and tests can point at doubles).
//!
//! Example:
//! ```toml
//! [directory]
//! server_url = "ldaps://ldaps.ad.example.edu"
//! user_domain = "ad.example.edu"
//! search_base = "ou=IDMUsers,DC=AD,DC=example,DC=edu"
//!
//! [oauth]
//! client_id = "matrikel"
//! client_secret = "secret"
//! auth_url = "https://git.example.edu/oauth/authorize"
//! token_url = "https://git.example.edu/oauth/token"
//! redirect_url = "https://app.example.edu/callback"
//! scopes = ["read_user"]
//!
//! [platform]
//! api_base_url = "https://git.example.edu/api/v4"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrikelConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub oauth: OAuthConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MatrikelConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override settings with `MATRIKEL_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from `lookup`, keyed by `MATRIKEL_*` variable name.
    /// Values that do not parse leave the setting untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MATRIKEL_LDAP_URL") {
            self.directory.server_url = url;
        }
        if let Some(domain) = lookup("MATRIKEL_LDAP_DOMAIN") {
            self.directory.user_domain = domain;
        }
        if let Some(base) = lookup("MATRIKEL_LDAP_SEARCH_BASE") {
            self.directory.search_base = base;
        }
        if let Some(filter) = lookup("MATRIKEL_LDAP_USER_FILTER") {
            self.directory.user_filter = filter;
        }
        if let Some(t) = lookup("MATRIKEL_LDAP_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.directory.timeout_seconds = t;
        }
        if let Some(b) = lookup("MATRIKEL_LDAP_STARTTLS").and_then(|v| parse_bool(&v)) {
            self.directory.start_tls = b;
        }
        if let Some(b) = lookup("MATRIKEL_LDAP_SKIP_TLS_VERIFY").and_then(|v| parse_bool(&v)) {
            self.directory.skip_tls_verify = b;
        }

        if let Some(id) = lookup("MATRIKEL_OAUTH_CLIENT_ID") {
            self.oauth.client_id = id;
        }
        if let Some(secret) = lookup("MATRIKEL_OAUTH_CLIENT_SECRET") {
            self.oauth.client_secret = secret;
        }
        if let Some(url) = lookup("MATRIKEL_OAUTH_AUTH_URL") {
            self.oauth.auth_url = url;
        }
        if let Some(url) = lookup("MATRIKEL_OAUTH_TOKEN_URL") {
            self.oauth.token_url = url;
        }
        if let Some(url) = lookup("MATRIKEL_OAUTH_REDIRECT_URL") {
            self.oauth.redirect_url = Some(url);
        }
        if let Some(scopes) = lookup("MATRIKEL_OAUTH_SCOPES") {
            self.oauth.scopes = scopes
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(style) = lookup("MATRIKEL_OAUTH_CLIENT_AUTH").and_then(|v| ClientAuthStyle::parse(&v)) {
            self.oauth.client_auth = style;
        }

        if let Some(url) = lookup("MATRIKEL_PLATFORM_URL") {
            self.platform.api_base_url = url;
        }
        if let Some(pattern) = lookup("MATRIKEL_PLATFORM_IDENTITY_PATTERN") {
            self.platform.identity_pattern = pattern;
        }
        if let Some(t) = lookup("MATRIKEL_PLATFORM_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.platform.timeout_seconds = t;
        }

        if let Some(level) = lookup("MATRIKEL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("MATRIKEL_LOG_FORMAT").and_then(|v| LogFormat::parse(&v)) {
            self.logging.format = format;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Directory (LDAP)
// ============================================================================

/// Directory server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DirectoryConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    pub server_url: String,

    /// Upgrade a plain ldap:// connection with STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Domain appended to the username to form the bind principal
    /// (`<username>@<user_domain>`). Empty binds with the bare username.
    #[serde(default)]
    pub user_domain: String,

    /// Base DN for user searches
    pub search_base: String,

    /// User search filter, `{username}` is replaced by the escaped username
    #[serde(default = "default_user_filter")]
    pub user_filter: String,

    #[serde(default)]
    pub attributes: DirectoryAttributes,

    /// Connect and per-operation timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_user_filter() -> String {
    "(sAMAccountName={username})".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            server_url: "ldaps://localhost:636".to_string(),
            start_tls: false,
            skip_tls_verify: false,
            user_domain: String::new(),
            search_base: String::new(),
            user_filter: default_user_filter(),
            attributes: DirectoryAttributes::default(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl DirectoryConfig {
    /// Bind principal for a username
    pub fn build_principal(&self, username: &str) -> String {
        if self.user_domain.is_empty() {
            username.to_string()
        } else {
            format!("{}@{}", username, self.user_domain)
        }
    }

    /// User search filter for an already escaped username
    pub fn build_user_filter(&self, escaped_username: &str) -> String {
        self.user_filter.replace("{username}", escaped_username)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.is_empty() {
            return Err(ConfigError::Missing("directory.server_url"));
        }

        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return Err(ConfigError::invalid(
                "directory.server_url",
                "must start with ldap:// or ldaps://",
            ));
        }

        if self.search_base.is_empty() {
            return Err(ConfigError::Missing("directory.search_base"));
        }

        if !self.user_filter.contains("{username}") {
            return Err(ConfigError::invalid(
                "directory.user_filter",
                "must contain {username} placeholder",
            ));
        }

        Ok(())
    }
}

/// Directory attribute names copied into a [`crate::Student`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DirectoryAttributes {
    #[serde(default = "default_id_attr")]
    pub id: String,

    #[serde(default = "default_forename_attr")]
    pub forename: String,

    #[serde(default = "default_surname_attr")]
    pub surname: String,

    #[serde(default = "default_email_attr")]
    pub email: String,
}

fn default_id_attr() -> String {
    "sAMAccountName".to_string()
}

fn default_forename_attr() -> String {
    "givenName".to_string()
}

fn default_surname_attr() -> String {
    "sn".to_string()
}

fn default_email_attr() -> String {
    "mail".to_string()
}

impl Default for DirectoryAttributes {
    fn default() -> Self {
        Self {
            id: default_id_attr(),
            forename: default_forename_attr(),
            surname: default_surname_attr(),
            email: default_email_attr(),
        }
    }
}

impl DirectoryAttributes {
    /// Attribute list in search-request order
    pub fn as_vec(&self) -> Vec<&str> {
        vec![
            self.id.as_str(),
            self.forename.as_str(),
            self.surname.as_str(),
            self.email.as_str(),
        ]
    }
}

// ============================================================================
// OAuth provider
// ============================================================================

/// How the client authenticates at the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthStyle {
    /// `client_id` and `client_secret` in the form body
    #[default]
    RequestBody,
    /// HTTP Basic authorization header
    BasicAuth,
}

/// OAuth2 authorization-code client settings. Owned by the caller and never
/// modified by the authenticator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub auth_url: String,

    #[serde(default)]
    pub token_url: String,

    #[serde(default)]
    pub redirect_url: Option<String>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub client_auth: ClientAuthStyle,
}

impl ClientAuthStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "request_body" | "body" => Some(Self::RequestBody),
            "basic_auth" | "basic" => Some(Self::BasicAuth),
            _ => None,
        }
    }
}

impl OAuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::Missing("oauth.client_id"));
        }

        parse_http_url("oauth.auth_url", &self.auth_url)?;
        parse_http_url("oauth.token_url", &self.token_url)?;

        if let Some(redirect) = &self.redirect_url {
            parse_http_url("oauth.redirect_url", redirect)?;
        }

        Ok(())
    }
}

/// Parse an absolute http(s) URL
pub fn parse_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing(field));
    }

    let url = Url::parse(value).map_err(|e| ConfigError::invalid(field, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::invalid(
            field,
            format!("unsupported scheme: {}", other),
        )),
    }
}

// ============================================================================
// Collaboration platform
// ============================================================================

/// Platform REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlatformConfig {
    /// API base URL. `/api/v4/` is appended when missing.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Pattern applied to the first external identity. Must define the
    /// named groups `surname`, `forename` and `id`.
    #[serde(default = "default_identity_pattern")]
    pub identity_pattern: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base_url() -> String {
    "https://gitlab.com/api/v4".to_string()
}

pub fn default_identity_pattern() -> String {
    r"cn=(?P<surname>[\w\s]+)\\,(?P<forename>[\w\s]+)\((?P<id>[\w\s]+)\)".to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            identity_pattern: default_identity_pattern(),
            timeout_seconds: default_timeout(),
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
