//! JSON view of the held tokens served on `/tokens`.

use std::fmt;

use chrono::{DateTime, Utc};
use odm_auth_common::auth::{decode_claims_unverified, TokenSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Token payload handed to the notebook.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStatus {
    /// Token to present to the API.
    pub access_token: String,
    /// Usually `Bearer`.
    pub token_type: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Seconds left at the time the payload was built, never negative.
    pub expires_in: i64,
    /// Expired, leeway included, when the payload was built.
    pub expired: bool,
    /// ID token claims, decoded without signature verification.
    #[serde(default)]
    pub id_token_claims: Option<Map<String, Value>>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenStatus {
    /// Payload for `tokens` as of `now`.
    #[must_use]
    pub fn from_tokens(tokens: &TokenSet, now: DateTime<Utc>, leeway_seconds: i64) -> Self {
        let id_token_claims = tokens.id_token.as_deref().and_then(|raw| {
            decode_claims_unverified(raw)
                .map_err(|err| debug!(error = %err, "ID token claims not decodable"))
                .ok()
        });

        Self {
            access_token: tokens.access_token.clone(),
            token_type: tokens.token_type.clone(),
            expires_at: tokens.expires_at,
            expires_in: (tokens.expires_at - now).num_seconds().max(0),
            expired: tokens.is_expired_at(now, leeway_seconds),
            id_token_claims,
            scope: tokens.scope.clone(),
        }
    }

    /// Expired when the listener said so or `expires_at` has passed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired || self.expires_at <= now
    }

    /// `sub`, `email` or similar string claim, if present.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.id_token_claims.as_ref()?.get(name)?.as_str()
    }
}

impl fmt::Debug for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStatus")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("expired", &self.expired)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use odm_auth_common::testing::fixtures::{token_set, unsigned_jwt};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_includes_decoded_claims() {
        let mut tokens = token_set("access", Some("refresh"), 3600);
        tokens.id_token = Some(unsigned_jwt(&json!({"sub": "auth0|42", "nonce": "n"})));

        let status = TokenStatus::from_tokens(&tokens, Utc::now(), 0);
        assert_eq!(status.claim("sub"), Some("auth0|42"));
        assert!(!status.expired);
        assert!(status.expires_in > 3500);
    }

    #[test]
    fn test_undecodable_id_token_is_omitted() {
        let mut tokens = token_set("access", None, 3600);
        tokens.id_token = Some("not-a-jwt".into());

        let status = TokenStatus::from_tokens(&tokens, Utc::now(), 0);
        assert!(status.id_token_claims.is_none());
    }

    /// Validates `expires_in` is clamped at zero once expired.
    #[test]
    fn test_expired_tokens_report_zero_seconds() {
        let tokens = token_set("access", None, 60);
        let later = tokens.expires_at + Duration::seconds(5);

        let status = TokenStatus::from_tokens(&tokens, later, 0);
        assert!(status.expired);
        assert_eq!(status.expires_in, 0);
    }

    #[test]
    fn test_status_expires_with_the_clock() {
        let tokens = token_set("access", None, 60);
        let status = TokenStatus::from_tokens(&tokens, Utc::now(), 0);

        assert!(!status.is_expired_at(tokens.expires_at - Duration::seconds(1)));
        assert!(status.is_expired_at(tokens.expires_at));
    }

    #[test]
    fn test_debug_hides_the_access_token() {
        let tokens = token_set("super-secret", None, 60);
        let status = TokenStatus::from_tokens(&tokens, Utc::now(), 0);
        assert!(!format!("{status:?}").contains("super-secret"));
    }
}
