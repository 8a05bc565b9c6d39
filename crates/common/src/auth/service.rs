//! Login orchestration
//!
//! Ties the session, the authorization URL builder, the code exchanger and
//! the token manager together behind the three operations the HTTP layer
//! needs: begin a login, complete it from the callback, and look up tokens.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::authorize::{build_authorize_url, AuthorizeError};
use super::exchange::{CodeExchanger, TokenExchangeError};
use super::session::{AuthSession, LoginHints};
use super::token_manager::{TokenLookup, TokenManager};
use super::types::{OAuthConfig, TokenSet};

/// Failure to complete a login from the callback.
#[derive(Debug, Clone, Error)]
pub enum LoginError {
    /// The callback state is not the one issued for the current attempt.
    #[error("callback state does not match the login attempt")]
    StateMismatch,

    #[error(transparent)]
    TokenExchange(#[from] TokenExchangeError),
}

/// Result of a completed login.
#[derive(Debug, Clone)]
pub struct CompletedLogin {
    /// Tokens now held by the session.
    pub tokens: TokenSet,
    /// Where to send the browser; empty means close the window.
    pub redirect_path: String,
    /// Selection hints given to `/redirect`.
    pub hints: LoginHints,
}

/// OAuth login service shared by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct OAuthService {
    config: OAuthConfig,
    session: Arc<AuthSession>,
    exchanger: CodeExchanger,
    token_manager: TokenManager,
}

impl OAuthService {
    /// Assemble the facade from its parts.
    #[must_use]
    pub fn new(
        config: OAuthConfig,
        session: Arc<AuthSession>,
        exchanger: CodeExchanger,
        token_manager: TokenManager,
    ) -> Self {
        Self { config, session, exchanger, token_manager }
    }

    /// Start a login attempt and return the authorization URL.
    ///
    /// Any previous attempt is abandoned: its state no longer verifies.
    ///
    /// # Errors
    /// Returns [`AuthorizeError`] if the provider configuration is incomplete.
    pub fn begin_login(
        &self,
        redirect_path: String,
        hints: LoginHints,
    ) -> Result<String, AuthorizeError> {
        let attempt = self.session.begin(redirect_path, hints);
        build_authorize_url(&self.config, &attempt.code_challenge, &attempt.state)
    }

    /// Complete a login from the callback's `code` and `state`.
    ///
    /// The state is checked before anything touches the network. Tokens are
    /// replaced only after a successful exchange.
    ///
    /// # Errors
    /// Returns [`LoginError::StateMismatch`] or the exchange failure.
    pub async fn complete_login(
        &self,
        code: &str,
        state: &str,
    ) -> Result<CompletedLogin, LoginError> {
        let Some(verified) = self.session.verify_state(state) else {
            warn!(state_len = state.len(), "callback state mismatch");
            return Err(LoginError::StateMismatch);
        };

        let tokens = self.exchanger.exchange(code, &verified.code_verifier).await?;
        self.session.store_tokens(tokens.clone());
        info!(redirect = %verified.redirect_path, "login completed");

        Ok(CompletedLogin {
            tokens,
            redirect_path: verified.redirect_path,
            hints: verified.hints,
        })
    }

    /// See [`TokenManager::get_token`].
    pub async fn get_token(&self) -> TokenLookup {
        self.token_manager.get_token().await
    }

    /// Pending login and held tokens.
    #[must_use]
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Token lifecycle built on the session.
    #[must_use]
    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    /// Provider registration in use.
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}
