//! Polling client used from inside the notebook kernel.
//!
//! The kernel never runs the OAuth flow itself. It finds the listener via the
//! inputs record, asks it for tokens, and falls back to showing the user a
//! login link.

use std::time::Duration;

use chrono::Utc;
use odm_auth_common::auth::{verify_nonce, JwtError, TokenEvent, TokenResponse, TokenSet};
use odm_auth_domain::constants::{DEFAULT_POLL_TIMEOUT_SECS, POLL_INTERVAL_MS};
use odm_auth_domain::{Config, ListenerSettings, OdmAuthError, Result};
use parking_lot::Mutex;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::InfraError;
use crate::inputs::InputStore;
use crate::server::TokenStatus;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of waiting for the listener.
#[derive(Debug, Clone, PartialEq)]
pub enum NotebookAuth {
    Authenticated(TokenStatus),
    /// No token within the bound; the user should open `login_url`.
    AuthRequired { login_url: String },
}

/// Notebook-side view of the callback listener.
#[derive(Debug)]
pub struct NotebookClient {
    http: Client,
    inputs: InputStore,
    listener: ListenerSettings,
    token_prefix: String,
    poll_interval: Duration,
    current: Mutex<Option<TokenStatus>>,
}

impl NotebookClient {
    /// # Errors
    /// Returns `OdmAuthError::Config` if the HTTP client cannot be built.
    pub fn new(
        listener: ListenerSettings,
        inputs: InputStore,
        token_prefix: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OdmAuthError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            inputs,
            listener,
            token_prefix: token_prefix.into(),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            current: Mutex::new(None),
        })
    }

    /// Client for the listener described by `config`, reading defaults for
    /// the inputs record from the environment.
    ///
    /// # Errors
    /// See [`NotebookClient::new`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.listener.clone(),
            InputStore::with_env_defaults(config.input_file.clone()),
            config.auth.token_prefix.clone(),
        )
    }

    /// Override the 250 ms poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Link that starts a login and closes the window afterwards.
    #[must_use]
    pub fn login_url(&self) -> String {
        self.listener.login_url()
    }

    /// Port recorded by the running listener.
    pub async fn listener_port(&self) -> Option<u16> {
        self.inputs.read().await.port
    }

    /// Ask the listener on `port` for tokens once.
    ///
    /// Returns `Ok(None)` when the listener answers that a login is needed.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Network` if the listener cannot be reached, or
    /// another error for unexpected responses.
    pub async fn fetch_tokens(&self, port: u16) -> Result<Option<TokenStatus>> {
        let url = format!("http://127.0.0.1:{port}/tokens");
        let response = self.http.get(&url).send().await.map_err(InfraError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response
            .error_for_status()
            .map_err(InfraError::from)?
            .json::<TokenStatus>()
            .await
            .map_err(InfraError::from)?;
        Ok(Some(status))
    }

    /// Poll the listener every 250 ms until it holds a token or `timeout`
    /// elapses.
    pub async fn wait_for_token(&self, timeout: Duration) -> NotebookAuth {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(port) = self.listener_port().await {
                match self.fetch_tokens(port).await {
                    Ok(Some(status)) => {
                        info!(port, expires_in = status.expires_in, "token available");
                        *self.current.lock() = Some(status.clone());
                        return NotebookAuth::Authenticated(status);
                    }
                    Ok(None) => debug!(port, "listener holds no token yet"),
                    Err(err) => debug!(port, error = %err, "listener not reachable"),
                }
            } else {
                debug!("no listener port recorded yet");
            }

            if Instant::now() + self.poll_interval > deadline {
                return NotebookAuth::AuthRequired { login_url: self.login_url() };
            }
            sleep(self.poll_interval).await;
        }
    }

    /// [`NotebookClient::wait_for_token`] with the default 30 second bound.
    pub async fn wait_for_token_default(&self) -> NotebookAuth {
        self.wait_for_token(Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS)).await
    }

    /// Accept a token the browser delivered directly.
    ///
    /// For [`TokenEvent::Fresh`] the ID token must carry the login's nonce;
    /// [`TokenEvent::Reused`] tokens are taken as they are.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Security` on a missing or mismatched nonce, or
    /// `OdmAuthError::InvalidInput` when `expires_in` is out of range.
    pub fn adopt_browser_token(
        &self,
        payload: TokenResponse,
        event: TokenEvent,
    ) -> Result<TokenStatus> {
        if let TokenEvent::Fresh { nonce } = &event {
            let id_token = payload.id_token.as_deref().ok_or(JwtError::MissingNonce);
            id_token.and_then(|t| verify_nonce(t, nonce)).map_err(InfraError::from)?;
        }

        let tokens = TokenSet::from_response(payload, Utc::now()).map_err(InfraError::from)?;
        let status = TokenStatus::from_tokens(&tokens, Utc::now(), 0);
        *self.current.lock() = Some(status.clone());
        debug!(fresh = matches!(event, TokenEvent::Fresh { .. }), "browser token adopted");
        Ok(status)
    }

    /// Token last obtained from the listener or the browser.
    #[must_use]
    pub fn current_token(&self) -> Option<TokenStatus> {
        self.current.lock().clone()
    }

    /// Token to present to the API. Once the held token has expired the
    /// listener is asked again, which refreshes it on its side.
    ///
    /// If the listener cannot be reached the expired token is still returned.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Auth` when no usable token is held and the
    /// listener has none to give.
    pub async fn token(&self) -> Result<TokenStatus> {
        let held = self.current_token();
        if let Some(status) = held.as_ref().filter(|s| !s.is_expired_at(Utc::now())) {
            return Ok(status.clone());
        }

        let fetched = match self.listener_port().await {
            Some(port) => self.fetch_tokens(port).await,
            None => Ok(None),
        };

        match (fetched, held) {
            (Ok(Some(status)), _) => {
                debug!(expires_in = status.expires_in, "token fetched from listener");
                *self.current.lock() = Some(status.clone());
                Ok(status)
            }
            (Err(err), Some(stale)) => {
                warn!(error = %err, "listener not reachable, keeping expired token");
                Ok(stale)
            }
            (Ok(None) | Err(_), _) => {
                Err(OdmAuthError::Auth(format!("not logged in; visit {}", self.login_url())))
            }
        }
    }

    /// Add `Authorization: {prefix} {access_token}` to an API request, using
    /// [`NotebookClient::token`].
    ///
    /// # Errors
    /// See [`NotebookClient::token`].
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token().await?;
        Ok(request.header(AUTHORIZATION, format!("{} {}", self.token_prefix, token.access_token)))
    }
}
