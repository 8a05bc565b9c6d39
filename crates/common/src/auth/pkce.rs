//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 with the `S256` method. The verifier never leaves the
//! listener process; only the derived challenge is placed in the
//! authorization URL.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

const VERIFIER_BYTES: usize = 32;
const STATE_NONCE_BYTES: usize = 8;
const MIN_VERIFIER_LEN: usize = 43;
const MAX_VERIFIER_LEN: usize = 128;

/// Errors raised while deriving a code challenge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PkceError {
    #[error("code verifier is empty")]
    EmptyVerifier,

    /// Length outside 43..=128 or a character outside the unreserved set.
    #[error("code verifier is not RFC 7636 compliant: {0}")]
    InvalidVerifier(String),
}

/// Generate a cryptographically secure code verifier
///
/// 32 random bytes, base64url without padding (43 characters).
#[must_use]
pub fn generate_code_verifier() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; VERIFIER_BYTES] = rng.gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Derive the `S256` code challenge: `BASE64URL(SHA256(ASCII(verifier)))`.
///
/// # Errors
/// Returns [`PkceError`] if the verifier is empty or not RFC 7636 compliant.
pub fn derive_code_challenge(verifier: &str) -> Result<String, PkceError> {
    if verifier.is_empty() {
        return Err(PkceError::EmptyVerifier);
    }
    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len()) {
        return Err(PkceError::InvalidVerifier(format!(
            "length {} outside {MIN_VERIFIER_LEN}..={MAX_VERIFIER_LEN}",
            verifier.len()
        )));
    }
    if let Some(c) = verifier.chars().find(|c| !is_unreserved(*c)) {
        return Err(PkceError::InvalidVerifier(format!("unexpected character {c:?}")));
    }

    let hash = Sha256::digest(verifier.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(hash))
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

/// Generate the anti-CSRF state value.
///
/// Format: `{audience}{server_name}{unix_seconds}.{nonce}` where the nonce is
/// 8 random bytes, base64url encoded. The value is opaque to the provider and
/// returned verbatim on the callback.
#[must_use]
pub fn generate_state(audience: &str, server_name: &str, unix_seconds: i64) -> String {
    let mut rng = rand::thread_rng();
    let nonce: [u8; STATE_NONCE_BYTES] = rng.gen();
    format!("{audience}{server_name}{unix_seconds}.{}", URL_SAFE_NO_PAD.encode(nonce))
}

/// Compare the expected state with the one received on the callback.
///
/// Constant time with respect to the content of equal-length inputs.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    let (a, b) = (expected.as_bytes(), actual.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Verifier and the challenge derived from it.
///
/// The two fields are only ever produced together, so the challenge placed in
/// an authorization URL always matches the verifier later sent to the token
/// endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
    code_verifier: String,
    code_challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier and its challenge.
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        // A generated verifier is always 43 unreserved characters.
        let code_challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()));
        Self { code_verifier, code_challenge }
    }

    /// Build a pair from an existing verifier.
    ///
    /// # Errors
    /// Propagates [`PkceError`] from [`derive_code_challenge`].
    pub fn from_verifier(verifier: impl Into<String>) -> Result<Self, PkceError> {
        let code_verifier = verifier.into();
        let code_challenge = derive_code_challenge(&code_verifier)?;
        Ok(Self { code_verifier, code_challenge })
    }

    /// Secret sent with the code exchange.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.code_verifier
    }

    /// S256 challenge sent in the authorization URL.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.code_challenge
    }

    /// Get the challenge method (always "S256")
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Validates the RFC 7636 appendix B test vector.
    #[test]
    fn test_rfc7636_vector() {
        let challenge = derive_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
            .expect("Failed to derive challenge");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    /// Validates `PkcePair::generate` output shape.
    ///
    /// Assertions:
    /// - Verifier is exactly 43 characters.
    /// - Neither value carries padding or non URL-safe characters.
    /// - Challenge is the derivation of the verifier.
    #[test]
    fn test_generate_pair() {
        let pair = PkcePair::generate();

        assert_eq!(pair.verifier().len(), 43);
        for value in [pair.verifier(), pair.challenge()] {
            assert!(!value.contains('='));
            assert!(!value.contains('+'));
            assert!(!value.contains('/'));
        }
        assert_eq!(
            derive_code_challenge(pair.verifier()).expect("Failed to derive challenge"),
            pair.challenge()
        );
        assert_eq!(pair.challenge_method(), "S256");
    }

    /// Validates that two generations never share a verifier.
    #[test]
    fn test_unique_pairs() {
        let first = PkcePair::generate();
        let second = PkcePair::generate();
        assert_ne!(first.verifier(), second.verifier());
        assert_ne!(first.challenge(), second.challenge());
    }

    #[test]
    fn test_empty_verifier_rejected() {
        assert_eq!(derive_code_challenge(""), Err(PkceError::EmptyVerifier));
    }

    #[test]
    fn test_non_compliant_verifiers_rejected() {
        assert!(matches!(derive_code_challenge("short"), Err(PkceError::InvalidVerifier(_))));
        let spaced = format!("{} ", "a".repeat(50));
        assert!(matches!(derive_code_challenge(&spaced), Err(PkceError::InvalidVerifier(_))));
        let too_long = "a".repeat(129);
        assert!(matches!(derive_code_challenge(&too_long), Err(PkceError::InvalidVerifier(_))));
    }

    /// Validates state layout and uniqueness.
    #[test]
    fn test_state_format() {
        let state = generate_state("https://odm.example.org/api", "gpu", 1_700_000_000);
        let (prefix, nonce) = state.rsplit_once('.').expect("state should contain a nonce");

        assert_eq!(prefix, "https://odm.example.org/apigpu1700000000");
        assert_eq!(nonce.len(), 11);
        assert_ne!(state, generate_state("https://odm.example.org/api", "gpu", 1_700_000_000));
    }

    #[test]
    fn test_validate_state() {
        assert!(validate_state("abc.def", "abc.def"));
        assert!(!validate_state("abc.def", "abc.deg"));
        assert!(!validate_state("abc.def", "abc.de"));
        assert!(!validate_state("abc", ""));
    }
}
