//! Authorization code exchange with bounded retry.
//!
//! Only connection-level failures are retried. A provider that answers, even
//! with an error, is never asked again for the same code.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use super::client::OAuthClientError;
use super::traits::TokenEndpoint;
use super::types::TokenSet;
use crate::resilience::policies::PredicateRetry;
use crate::resilience::{RetryConfig, RetryError, RetryExecutor};

/// Upper bound on attempts for a single authorization code.
pub const MAX_EXCHANGE_ATTEMPTS: u32 = 5;

/// Token exchange failure after retries were applied.
#[derive(Debug, Clone, Error)]
pub enum TokenExchangeError {
    /// The provider answered and refused the grant.
    #[error("token exchange rejected: {source}")]
    Rejected {
        #[source]
        source: OAuthClientError,
    },

    /// Every attempt failed to reach the provider.
    #[error("token exchange failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: OAuthClientError },

    #[error("invalid exchange configuration: {0}")]
    InvalidConfiguration(String),
}

type TransientOnly = PredicateRetry<fn(&OAuthClientError, u32) -> bool>;

fn is_transient(error: &OAuthClientError, _attempt: u32) -> bool {
    error.is_transient()
}

/// Exchanges authorization codes against a [`TokenEndpoint`].
#[derive(Clone)]
pub struct CodeExchanger {
    endpoint: Arc<dyn TokenEndpoint>,
    executor: RetryExecutor<TransientOnly>,
}

impl CodeExchanger {
    /// `max_attempts` is clamped to [`MAX_EXCHANGE_ATTEMPTS`]; the backoff is
    /// fixed between attempts.
    ///
    /// # Errors
    /// Returns [`TokenExchangeError::InvalidConfiguration`] for zero attempts.
    pub fn new(
        endpoint: Arc<dyn TokenEndpoint>,
        max_attempts: u32,
        backoff: Duration,
    ) -> Result<Self, TokenExchangeError> {
        let config = RetryConfig::builder()
            .max_attempts(max_attempts.min(MAX_EXCHANGE_ATTEMPTS))
            .fixed_backoff(backoff)
            .build()
            .map_err(|e| TokenExchangeError::InvalidConfiguration(e.to_string()))?;
        let policy: TransientOnly =
            PredicateRetry::new(is_transient as fn(&OAuthClientError, u32) -> bool);
        Ok(Self { endpoint, executor: RetryExecutor::new(config, policy) })
    }

    /// Attempts allowed per callback, capped at [`MAX_EXCHANGE_ATTEMPTS`].
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.executor.config().max_attempts
    }

    /// Exchange `code`, proving possession of `code_verifier`.
    ///
    /// # Errors
    /// Returns [`TokenExchangeError`] when the provider rejects the grant or
    /// cannot be reached within the attempt budget.
    pub async fn exchange(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, TokenExchangeError> {
        let endpoint = &self.endpoint;
        let result = self
            .executor
            .execute(|| async move { endpoint.exchange_code(code, code_verifier).await })
            .await;

        match result {
            Ok(tokens) => {
                info!(expires_in = tokens.expires_in, "authorization code exchanged");
                Ok(tokens)
            }
            Err(RetryError::NonRetryable { source, .. }) => {
                Err(TokenExchangeError::Rejected { source })
            }
            Err(RetryError::AttemptsExhausted { attempts, last_error }) => {
                Err(TokenExchangeError::RetriesExhausted { attempts, last_error })
            }
            Err(RetryError::InvalidConfiguration { message }) => {
                Err(TokenExchangeError::InvalidConfiguration(message))
            }
        }
    }
}

impl std::fmt::Debug for CodeExchanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeExchanger").field("executor", &self.executor).finish_non_exhaustive()
    }
}
