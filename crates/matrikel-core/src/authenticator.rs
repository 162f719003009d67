//! Contract shared by every authentication backend

use crate::types::Student;
use async_trait::async_trait;

/// Turns backend-specific credentials into a [`Student`] or a classified
/// failure.
///
/// Implementations hold only immutable configuration, so one instance can
/// serve concurrent calls. Each call owns its network resources and releases
/// them before returning.
#[async_trait]
pub trait Authenticator: Send + Sync {
    type Credentials: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn authenticate(&self, credentials: &Self::Credentials) -> Result<Student, Self::Error>;
}
