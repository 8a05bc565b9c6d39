//! Authorization URL construction.

use thiserror::Error;

use super::types::OAuthConfig;

/// Errors raised while building an authorization URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizeError {
    #[error("code challenge is empty")]
    EmptyChallenge,

    #[error("state is empty")]
    EmptyState,

    #[error("authorization URL is incomplete: {0} is not configured")]
    MissingSetting(&'static str),
}

/// Build `{provider}/authorize?...` for the authorization code + PKCE flow.
///
/// `scope` always carries `openid`, and `offline_access` so that the provider
/// issues a refresh token. Every value is percent-encoded.
///
/// # Errors
/// Returns [`AuthorizeError`] when the challenge, state, provider URL or
/// client id is empty.
pub fn build_authorize_url(
    config: &OAuthConfig,
    code_challenge: &str,
    state: &str,
) -> Result<String, AuthorizeError> {
    if code_challenge.is_empty() {
        return Err(AuthorizeError::EmptyChallenge);
    }
    if state.is_empty() {
        return Err(AuthorizeError::EmptyState);
    }
    if config.provider_url.is_empty() {
        return Err(AuthorizeError::MissingSetting("provider URL"));
    }
    if config.client_id.is_empty() {
        return Err(AuthorizeError::MissingSetting("client id"));
    }

    let scope = normalize_scope(&config.scope);
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("scope", scope.as_str()),
        ("audience", config.audience.as_str()),
        ("code_challenge", code_challenge),
        ("code_challenge_method", "S256"),
        ("state", state),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("{}?{}", config.authorization_url(), query_string))
}

/// `openid` first, `offline_access` appended when missing, duplicates dropped.
fn normalize_scope(scope: &str) -> String {
    let mut scopes: Vec<&str> = Vec::new();
    for s in std::iter::once("openid").chain(scope.split_whitespace()) {
        if !scopes.contains(&s) {
            scopes.push(s);
        }
    }
    if !scopes.contains(&"offline_access") {
        scopes.push("offline_access");
    }
    scopes.join(" ")
}
