//! Collaboration platform REST client (GitLab API v4)

use matrikel_core::DelegatedError;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

const API_VERSION_PATH: &str = "api/v4/";

/// Account returned by `GET /user`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformUser {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub email: String,

    /// Identities from other systems linked to this account
    #[serde(default)]
    pub identities: Vec<LinkedIdentity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkedIdentity {
    #[serde(default)]
    pub provider: String,

    #[serde(default)]
    pub extern_uid: String,
}

/// Normalize an API base URL so that it ends in `/api/v4/`.
///
/// `https://git.example.edu`, `https://git.example.edu/api/v4` and
/// `https://git.example.edu/api/v4/` all resolve to the same base.
pub fn normalize_api_base(raw: &str) -> Result<Url, DelegatedError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }

    let mut url = Url::parse(&raw).map_err(|e| {
        warn!("Invalid platform base URL {}: {}", raw, e);
        DelegatedError::InvalidUrl
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        warn!("Platform base URL is not an http(s) URL: {}", raw);
        return Err(DelegatedError::InvalidUrl);
    }

    if !url.path().ends_with(API_VERSION_PATH) {
        let path = format!("{}{}", url.path(), API_VERSION_PATH);
        url.set_path(&path);
    }

    Ok(url)
}

/// Client authenticated with a user's access token
pub struct PlatformClient<'a> {
    http: &'a Client,
    base_url: Url,
    access_token: &'a str,
}

impl<'a> PlatformClient<'a> {
    pub fn new(http: &'a Client, base_url: &str, access_token: &'a str) -> Result<Self, DelegatedError> {
        Ok(Self {
            http,
            base_url: normalize_api_base(base_url)?,
            access_token,
        })
    }

    /// Fetch the account the access token belongs to
    pub async fn current_user(&self) -> Result<PlatformUser, DelegatedError> {
        let url = self.base_url.join("user").map_err(|e| {
            warn!("Failed to build user endpoint URL: {}", e);
            DelegatedError::InvalidUrl
        })?;

        debug!("Fetching current user from: {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(self.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!("User API unreachable: {}", e);
                DelegatedError::UserAccessFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("User API returned status: {}", status);
            return Err(DelegatedError::UserAccessFailed);
        }

        response.json::<PlatformUser>().await.map_err(|e| {
            warn!("Malformed user API response: {}", e);
            DelegatedError::UserAccessFailed
        })
    }
}
