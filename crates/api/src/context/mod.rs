//! Application context - dependency injection container

use std::sync::Arc;

use odm_auth_common::auth::{OAuthService, TokenEndpoint};
use odm_auth_domain::{Config, Result};
use odm_auth_infra::{build_service, connect, CallbackServer, InputStore, NotebookClient};

/// Application context - holds the configured services
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Validated configuration the context was built from.
    pub config: Config,
    /// OAuth flow shared with the listener.
    pub service: OAuthService,
    /// Inputs record shared with the notebook kernel.
    pub inputs: InputStore,
}

impl AppContext {
    /// Context talking to the configured identity provider.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Config` if the service cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let service = connect(&config)?;
        Ok(Self::assemble(config, service))
    }

    /// Context over a caller supplied token endpoint.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Config` if the exchange settings are invalid.
    pub fn with_endpoint(config: Config, endpoint: Arc<dyn TokenEndpoint>) -> Result<Self> {
        let service = build_service(&config, endpoint)?;
        Ok(Self::assemble(config, service))
    }

    fn assemble(config: Config, service: OAuthService) -> Self {
        let inputs = InputStore::with_env_defaults(config.input_file.clone());
        Self { config, service, inputs }
    }

    /// Bind and start the callback listener.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Network` if the port cannot be bound.
    pub async fn start_listener(&self) -> Result<CallbackServer> {
        let server = CallbackServer::start(
            self.service.clone(),
            self.config.listener.clone(),
            self.inputs.clone(),
        )
        .await?;
        crate::utils::logging::log_listener_ready(&self.config, server.port());
        Ok(server)
    }

    /// Notebook-side client for the same listener settings.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Config` if the HTTP client cannot be built.
    pub fn notebook_client(&self) -> Result<NotebookClient> {
        NotebookClient::new(
            self.config.listener.clone(),
            self.inputs.clone(),
            self.config.auth.token_prefix.clone(),
        )
    }
}
