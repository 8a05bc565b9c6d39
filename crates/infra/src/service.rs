//! Wiring of the OAuth service from loaded configuration.

use std::sync::Arc;
use std::time::Duration;

use odm_auth_common::auth::{
    AuthSession, CodeExchanger, OAuthClient, OAuthService, TokenEndpoint, TokenManager,
};
use odm_auth_domain::{Config, OdmAuthError, Result};

use crate::config::oauth_config;
use crate::errors::InfraError;

/// Service talking to the configured identity provider over HTTP.
///
/// # Errors
/// Returns `OdmAuthError::Config` if the HTTP client or exchange settings
/// are invalid.
pub fn connect(config: &Config) -> Result<OAuthService> {
    let client = OAuthClient::new(oauth_config(config)).map_err(InfraError::from)?;
    build_service(config, Arc::new(client))
}

/// Service over an arbitrary token endpoint.
///
/// # Errors
/// Returns `OdmAuthError::Config` if the exchange settings are invalid.
pub fn build_service(config: &Config, endpoint: Arc<dyn TokenEndpoint>) -> Result<OAuthService> {
    let session = Arc::new(AuthSession::new(
        config.auth.audience.clone(),
        config.listener.server_name.clone(),
    ));
    let exchanger = CodeExchanger::new(
        endpoint.clone(),
        config.exchange.max_attempts,
        Duration::from_millis(config.exchange.backoff_ms),
    )
    .map_err(|e| OdmAuthError::Config(e.to_string()))?;
    let token_manager = TokenManager::new(session.clone(), endpoint, config.refresh_leeway_secs);

    Ok(OAuthService::new(oauth_config(config), session, exchanger, token_manager))
}
