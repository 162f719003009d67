//! Authorization code exchange (RFC 6749 section 4.1.3)

use matrikel_core::config::{ClientAuthStyle, OAuthConfig};
use matrikel_core::DelegatedError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::form_urlencoded;
use url::Url;

/// Token endpoint response. Only `access_token` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchange a one-time authorization code for an access token
pub(crate) async fn exchange_code(
    http: &Client,
    config: &OAuthConfig,
    token_url: &Url,
    code: &str,
) -> Result<TokenResponse, DelegatedError> {
    let mut form: Vec<(&str, &str)> = vec![("grant_type", "authorization_code"), ("code", code)];
    if let Some(redirect) = &config.redirect_url {
        form.push(("redirect_uri", redirect.as_str()));
    }

    let mut request = http
        .post(token_url.clone())
        .header(ACCEPT, "application/json");

    match config.client_auth {
        ClientAuthStyle::RequestBody => {
            form.push(("client_id", config.client_id.as_str()));
            form.push(("client_secret", config.client_secret.as_str()));
        }
        ClientAuthStyle::BasicAuth => {
            // RFC 6749 section 2.3.1: both parts are form-encoded first
            request = request.basic_auth(
                form_encode(&config.client_id),
                Some(form_encode(&config.client_secret)),
            );
        }
    }

    debug!("Exchanging authorization code at: {}", token_url);

    let response = request.form(&form).send().await.map_err(|e| {
        warn!("Token endpoint unreachable: {}", e);
        DelegatedError::TokenExchangeFailed
    })?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.text().await.map_err(|e| {
        warn!("Failed to read token response: {}", e);
        DelegatedError::TokenExchangeFailed
    })?;

    if !status.is_success() {
        warn!("Token endpoint rejected authorization code: {}", status);
        debug!("Token endpoint response: {}", body);
        return Err(DelegatedError::TokenExchangeFailed);
    }

    let token = parse_token_response(&content_type, &body)?;
    if token.access_token.is_empty() {
        warn!("Token endpoint response has no access_token");
        return Err(DelegatedError::TokenExchangeFailed);
    }

    Ok(token)
}

/// Decode a token response. Some providers answer with a form-encoded body
/// instead of JSON.
fn parse_token_response(content_type: &str, body: &str) -> Result<TokenResponse, DelegatedError> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let parsed = match media_type.as_str() {
        "application/x-www-form-urlencoded" | "text/plain" => {
            serde_urlencoded::from_str::<TokenResponse>(body).map_err(|e| e.to_string())
        }
        _ => serde_json::from_str::<TokenResponse>(body).map_err(|e| e.to_string()),
    };

    parsed.map_err(|e| {
        warn!("Malformed token response: {}", e);
        DelegatedError::TokenExchangeFailed
    })
}

fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_token() {
        let body = r#"{"access_token":"tok","token_type":"Bearer","expires_in":7200,"refresh_token":"ref","scope":"read_user"}"#;
        let token = parse_token_response("application/json; charset=utf-8", body).unwrap();

        assert_eq!(token.access_token, "tok");
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        assert_eq!(token.expires_in, Some(7200));
        assert_eq!(token.refresh_token.as_deref(), Some("ref"));
    }

    #[test]
    fn test_parse_form_token() {
        let body = "access_token=tok&token_type=bearer&expires_in=3600";
        let token = parse_token_response("application/x-www-form-urlencoded", body).unwrap();

        assert_eq!(token.access_token, "tok");
        assert_eq!(token.expires_in, Some(3600));
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error":"invalid_grant","error_description":"The provided authorization grant is invalid"}"#;
        assert_eq!(
            parse_token_response("application/json", body).unwrap_err(),
            DelegatedError::TokenExchangeFailed
        );
        assert!(parse_token_response("", "not json").is_err());
    }

    #[test]
    fn test_form_encode() {
        assert_eq!(form_encode("client id"), "client+id");
        assert_eq!(form_encode("s3cr:t&"), "s3cr%3At%26");
    }
}
