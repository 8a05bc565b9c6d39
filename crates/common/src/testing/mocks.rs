//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

#![allow(clippy::missing_errors_doc)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::fixtures::token_set;
use crate::auth::{OAuthClientError, TokenEndpoint, TokenSet};

type Scripted = Arc<Mutex<VecDeque<Result<TokenSet, OAuthClientError>>>>;

/// Scripted token endpoint
///
/// Each call pops the next scripted outcome; once the script is empty the
/// call succeeds with a fresh one-hour token set. Clones share state, so a
/// test can keep a handle while the code under test owns another.
///
/// # Examples
///
/// ```
/// use odm_auth_common::testing::MockTokenEndpoint;
///
/// let endpoint = MockTokenEndpoint::new();
/// endpoint.fail_exchange_transiently(2);
/// assert_eq!(endpoint.exchange_calls(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTokenEndpoint {
    exchange_script: Scripted,
    refresh_script: Scripted,
    exchange_calls: Arc<Mutex<u32>>,
    refresh_calls: Arc<Mutex<u32>>,
    last_verifier: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
}

impl MockTokenEndpoint {
    /// Endpoint with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next unscripted exchange call.
    pub fn push_exchange(&self, outcome: Result<TokenSet, OAuthClientError>) {
        self.exchange_script.lock().push_back(outcome);
    }

    /// Queue the outcome of the next unscripted refresh call.
    pub fn push_refresh(&self, outcome: Result<TokenSet, OAuthClientError>) {
        self.refresh_script.lock().push_back(outcome);
    }

    /// Queue `count` connection failures for the exchange.
    pub fn fail_exchange_transiently(&self, count: u32) {
        for attempt in 0..count {
            self.push_exchange(Err(OAuthClientError::Connection(format!(
                "connection refused (scripted failure {attempt})"
            ))));
        }
    }

    /// Number of code exchanges attempted.
    #[must_use]
    pub fn exchange_calls(&self) -> u32 {
        *self.exchange_calls.lock()
    }

    /// Number of refresh grants attempted.
    #[must_use]
    pub fn refresh_calls(&self) -> u32 {
        *self.refresh_calls.lock()
    }

    /// Verifier sent with the most recent exchange.
    #[must_use]
    pub fn last_verifier(&self) -> Option<String> {
        self.last_verifier.lock().clone()
    }

    /// Refresh token sent with the latest refresh grant.
    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().clone()
    }
}

#[async_trait]
impl TokenEndpoint for MockTokenEndpoint {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        *self.exchange_calls.lock() += 1;
        *self.last_verifier.lock() = Some(code_verifier.to_string());
        let scripted = self.exchange_script.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(token_set(&format!("access-for-{code}"), Some("mock_refresh_token"), 3600))
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthClientError> {
        *self.refresh_calls.lock() += 1;
        *self.last_refresh_token.lock() = Some(refresh_token.to_string());
        let scripted = self.refresh_script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(token_set("refreshed_access_token", None, 3600)))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::mocks.
    use super::*;

    /// Validates scripted outcomes are consumed in order before the default.
    #[tokio::test]
    async fn test_script_then_default() {
        let endpoint = MockTokenEndpoint::new();
        endpoint.fail_exchange_transiently(1);

        let first = endpoint.exchange_code("c", "v1").await;
        let second = endpoint.exchange_code("c", "v2").await;

        assert!(first.expect_err("scripted failure").is_transient());
        assert_eq!(second.expect("default success").access_token, "access-for-c");
        assert_eq!(endpoint.exchange_calls(), 2);
        assert_eq!(endpoint.last_verifier().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let endpoint = MockTokenEndpoint::new();
        let handle = endpoint.clone();
        endpoint.refresh("rt").await.expect("default refresh succeeds");
        assert_eq!(handle.refresh_calls(), 1);
        assert_eq!(handle.last_refresh_token().as_deref(), Some("rt"));
    }
}
