//! Credentials accepted by the authenticators

use std::fmt;

/// Username/password pair for a directory bind
#[derive(Clone)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
}

impl PasswordCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// One-time authorization code returned to the redirect URL
#[derive(Clone)]
pub struct AuthorizationCode(pub String);

impl AuthorizationCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AuthorizationCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for AuthorizationCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationCode(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let creds = PasswordCredentials::new("groot", "iamgroot");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("groot"));
        assert!(!rendered.contains("iamgroot"));

        let code = AuthorizationCode::from("one-time-code");
        assert!(!format!("{:?}", code).contains("one-time-code"));
        assert_eq!(code.as_str(), "one-time-code");
    }
}
