//! OAuth2 authentication through a collaboration platform
//!
//! The authorization code is exchanged for an access token, the platform's
//! current-user endpoint is queried with it, and the directory identity the
//! platform account is linked to is parsed out of the first external
//! identity.

mod client;
mod identity;
mod platform;
mod token;

pub use client::{generate_state, DelegatedAuthenticator};
pub use identity::{title_case, ExternalIdentity, ExternalIdentityParser};
pub use platform::{normalize_api_base, LinkedIdentity, PlatformClient, PlatformUser};
pub use token::TokenResponse;
