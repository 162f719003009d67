//! auth-url and exchange commands - OAuth authorization code flow

use super::CommandContext;
use anyhow::Result;
use matrikel_auth::{generate_state, DelegatedAuthenticator};

fn authenticator(ctx: &CommandContext) -> Result<DelegatedAuthenticator> {
    Ok(DelegatedAuthenticator::new(
        ctx.config.oauth.clone(),
        ctx.config.platform.clone(),
    )?)
}

pub fn auth_url(ctx: &CommandContext, state: Option<String>) -> Result<bool> {
    let authenticator = authenticator(ctx)?;
    let state = state.unwrap_or_else(generate_state);
    let url = authenticator.generate_auth_url(&state);

    if ctx.is_json() {
        let body = serde_json::json!({ "url": url, "state": state });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("state: {}", state);
        println!("{}", url);
    }

    Ok(true)
}

pub async fn exchange(ctx: &CommandContext, code: &str) -> Result<bool> {
    let authenticator = authenticator(ctx)?;

    let outcome = authenticator
        .authenticate(code)
        .await
        .map_err(|e| e.code());

    ctx.report(outcome)
}
