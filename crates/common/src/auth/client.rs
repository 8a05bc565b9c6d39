//! OAuth 2.0 token endpoint client
//!
//! Performs the authorization code and refresh token grants against
//! `{provider}/oauth/token` as form-encoded POSTs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::traits::TokenEndpoint;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for token endpoint operations
#[derive(Debug, Clone, Error)]
pub enum OAuthClientError {
    /// The request never produced a response (refused, reset, timed out).
    #[error("connection to token endpoint failed: {0}")]
    Connection(String),

    /// The provider answered with an OAuth error body.
    #[error("provider rejected the grant ({status}): {error}")]
    Provider { status: u16, error: OAuthError },

    /// The provider answered with a non-success status and no OAuth error.
    #[error("token endpoint returned HTTP {status}")]
    Http { status: u16 },

    #[error("failed to parse token response: {0}")]
    Parse(String),

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("configuration error: {0}")]
    Config(String),
}

impl OAuthClientError {
    /// Only failures to reach the endpoint are worth another attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Token endpoint client for public clients (no secret, PKCE instead).
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration
    ///
    /// # Errors
    /// Returns [`OAuthClientError::Config`] if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OAuthClientError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Use an existing HTTP client
    #[must_use]
    pub fn with_http_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn post_grant(&self, form: &[(&str, &str)]) -> Result<TokenSet, OAuthClientError> {
        let response = self.client.post(self.config.token_url()).form(form).send().await?;
        let received_at = Utc::now();
        let status = response.status();
        debug!(status = status.as_u16(), "token endpoint responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthError>(&body) {
                Ok(error) => OAuthClientError::Provider { status: status.as_u16(), error },
                Err(_) => OAuthClientError::Http { status: status.as_u16() },
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::Parse(e.to_string()))?;

        TokenSet::from_response(token_response, received_at)
            .map_err(|e| OAuthClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TokenEndpoint for OAuthClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        self.post_grant(&form).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        self.post_grant(&form).await
    }
}
