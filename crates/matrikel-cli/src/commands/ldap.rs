//! ldap command - username/password against the directory

use super::CommandContext;
use anyhow::Result;
use matrikel_auth::DirectoryAuthenticator;

pub async fn execute(ctx: &CommandContext, username: &str, password: &str) -> Result<bool> {
    let authenticator = DirectoryAuthenticator::new(ctx.config.directory.clone())?;

    let outcome = authenticator
        .authenticate(username, password)
        .await
        .map_err(|e| e.code());

    ctx.report(outcome)
}
