//! Token lifecycle manager
//!
//! Serves the cached token set, refreshing it once it has expired. A failed
//! refresh is logged and the stale set is served instead; the caller decides
//! what to do with an expired token.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::client::OAuthClientError;
use super::session::AuthSession;
use super::traits::TokenEndpoint;
use super::types::TokenSet;

/// Outcome of a token lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    /// Current tokens, possibly stale if a refresh just failed.
    Available(TokenSet),
    /// No usable tokens; the user has to log in through the browser.
    AuthRequired,
}

impl TokenLookup {
    /// Tokens, if available.
    #[must_use]
    pub fn into_tokens(self) -> Option<TokenSet> {
        match self {
            Self::Available(tokens) => Some(tokens),
            Self::AuthRequired => None,
        }
    }
}

/// A refresh grant that did not produce new tokens.
#[derive(Debug, Clone, Error)]
#[error("token refresh failed: {source}")]
pub struct RefreshFailure {
    #[from]
    source: OAuthClientError,
}

/// Token manager with refresh on expiry
///
/// Concurrent callers that find the same expired set may each issue a
/// refresh; whichever lands first replaces the tokens and the rest are
/// discarded.
#[derive(Clone)]
pub struct TokenManager {
    session: Arc<AuthSession>,
    endpoint: Arc<dyn TokenEndpoint>,
    leeway_seconds: i64,
}

impl TokenManager {
    /// Create a new token manager
    ///
    /// `leeway_seconds` makes a token count as expired that many seconds
    /// before `expires_at`.
    #[must_use]
    pub fn new(
        session: Arc<AuthSession>,
        endpoint: Arc<dyn TokenEndpoint>,
        leeway_seconds: i64,
    ) -> Self {
        Self { session, endpoint, leeway_seconds }
    }

    /// Get the current tokens, refreshing first if they have expired.
    ///
    /// Never fails: refresh errors are logged and the stale set is returned.
    pub async fn get_token(&self) -> TokenLookup {
        let Some(current) = self.session.tokens() else {
            debug!("no tokens held");
            return TokenLookup::AuthRequired;
        };

        if !current.is_expired(self.leeway_seconds) {
            return TokenLookup::Available(current);
        }

        let Some(refresh_token) = current.refresh_token.clone() else {
            info!("access token expired and no refresh token is held");
            return TokenLookup::AuthRequired;
        };

        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                let fresh = fresh.inherit_refresh_token(&current);
                if self.session.replace_tokens_if(&current.access_token, fresh.clone()) {
                    info!(expires_in = fresh.expires_in, "access token refreshed");
                    TokenLookup::Available(fresh)
                } else {
                    // A login or another refresh replaced the tokens meanwhile.
                    self.session.tokens().map_or(TokenLookup::AuthRequired, TokenLookup::Available)
                }
            }
            Err(failure) => {
                warn!(error = %failure, "serving stale token after failed refresh");
                TokenLookup::Available(current)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, RefreshFailure> {
        Ok(self.endpoint.refresh(refresh_token).await?)
    }

    /// Whether any tokens are held, expired or not.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.tokens().is_some()
    }

    /// Seconds until the held access token expires.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.session.tokens().map(|t| t.seconds_until_expiry())
    }

    /// Seconds before `expires_at` that already count as expired.
    #[must_use]
    pub fn leeway_seconds(&self) -> i64 {
        self.leeway_seconds
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::token_manager.
    use super::*;
    use crate::testing::fixtures::{expired_token_set, token_set};
    use crate::testing::MockTokenEndpoint;

    fn manager(endpoint: &MockTokenEndpoint) -> (Arc<AuthSession>, TokenManager) {
        let session = Arc::new(AuthSession::new("aud", ""));
        let manager = TokenManager::new(session.clone(), Arc::new(endpoint.clone()), 0);
        (session, manager)
    }

    /// Validates an empty session asks for a login without network calls.
    #[tokio::test]
    async fn test_no_tokens_requires_auth() {
        let endpoint = MockTokenEndpoint::new();
        let (_, manager) = manager(&endpoint);

        assert_eq!(manager.get_token().await, TokenLookup::AuthRequired);
        assert!(!manager.is_authenticated());
        assert_eq!(endpoint.refresh_calls(), 0);
    }

    /// Validates a valid cached token is served as-is.
    ///
    /// Assertions:
    /// - Identical token set is returned.
    /// - Zero refresh calls are made.
    #[tokio::test]
    async fn test_valid_token_served_from_cache() {
        let endpoint = MockTokenEndpoint::new();
        let (session, manager) = manager(&endpoint);
        let tokens = token_set("cached", Some("rt"), 3600);
        session.store_tokens(tokens.clone());

        assert_eq!(manager.get_token().await, TokenLookup::Available(tokens));
        assert_eq!(endpoint.refresh_calls(), 0);
    }

    /// Validates one refresh call replaces an expired set.
    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_refresh(Ok(token_set("renewed", None, 3600)));
        let (session, manager) = manager(&endpoint);
        session.store_tokens(expired_token_set("old", Some("rt-1")));

        let lookup = manager.get_token().await.into_tokens().expect("tokens should be available");

        assert_eq!(lookup.access_token, "renewed");
        assert_eq!(lookup.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(endpoint.refresh_calls(), 1);
        assert_eq!(endpoint.last_refresh_token().as_deref(), Some("rt-1"));
        assert_eq!(session.tokens().map(|t| t.access_token).as_deref(), Some("renewed"));
    }

    /// Validates a failed refresh serves the stale set and keeps it stored.
    #[tokio::test]
    async fn test_failed_refresh_serves_stale_token() {
        let endpoint = MockTokenEndpoint::new();
        endpoint.push_refresh(Err(OAuthClientError::Connection("refused".to_string())));
        let (session, manager) = manager(&endpoint);
        let stale = expired_token_set("old", Some("rt-1"));
        session.store_tokens(stale.clone());

        assert_eq!(manager.get_token().await, TokenLookup::Available(stale.clone()));
        assert_eq!(session.tokens(), Some(stale));
        assert_eq!(endpoint.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_requires_auth() {
        let endpoint = MockTokenEndpoint::new();
        let (session, manager) = manager(&endpoint);
        session.store_tokens(expired_token_set("old", None));

        assert_eq!(manager.get_token().await, TokenLookup::AuthRequired);
        assert_eq!(endpoint.refresh_calls(), 0);
        assert!(manager.is_authenticated());
    }

    /// Validates the leeway makes a soon-to-expire token refresh early.
    #[tokio::test]
    async fn test_leeway_triggers_refresh() {
        let endpoint = MockTokenEndpoint::new();
        let session = Arc::new(AuthSession::new("aud", ""));
        let manager = TokenManager::new(session.clone(), Arc::new(endpoint.clone()), 120);
        session.store_tokens(token_set("soon", Some("rt"), 60));

        let tokens = manager.get_token().await.into_tokens().expect("tokens should be available");
        assert_ne!(tokens.access_token, "soon");
        assert_eq!(endpoint.refresh_calls(), 1);
    }
}
