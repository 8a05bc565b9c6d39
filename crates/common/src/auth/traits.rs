//! Seam between token lifecycle logic and the provider's token endpoint.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenSet;

/// Token endpoint operations
///
/// Implemented by [`super::OAuthClient`] over HTTP and by the mocks in
/// `testing::mocks`. Returned token sets carry `expires_at` computed at the
/// moment the response was received.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code, proving possession of the verifier.
    ///
    /// # Errors
    /// Returns [`OAuthClientError`]; only connection-level failures report
    /// `is_transient()`.
    async fn exchange_code(&self, code: &str, code_verifier: &str)
        -> Result<TokenSet, OAuthClientError>;

    /// Redeem a refresh token for a new token set.
    ///
    /// # Errors
    /// Returns [`OAuthClientError`] if the grant is rejected or unreachable.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthClientError>;
}
