//! OAuth 2.0 authorization code + PKCE flow for a notebook-side listener
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  OAuthService   │  begin_login / complete_login / get_token
//! └────────┬────────┘
//!          │
//!          ├──► AuthSession        (PKCE pair, state, redirect, tokens)
//!          ├──► authorize          (authorization URL)
//!          ├──► CodeExchanger      (bounded retry over TokenEndpoint)
//!          └──► TokenManager       (refresh on expiry, stale fallback)
//!                     │
//!                     └──► TokenEndpoint ◄── OAuthClient (reqwest)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use odm_auth_common::auth::{
//!     AuthSession, CodeExchanger, LoginHints, OAuthClient, OAuthConfig, OAuthService,
//!     TokenManager,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OAuthConfig::new(
//!     "https://tenant.auth0.com",
//!     "client_id",
//!     "http://localhost:8888/asdc/callback",
//!     "openid profile email offline_access",
//!     "https://odm.example.org/api",
//! );
//! let endpoint = Arc::new(OAuthClient::new(config.clone())?);
//! let session = Arc::new(AuthSession::new(config.audience.clone(), ""));
//! let exchanger = CodeExchanger::new(endpoint.clone(), 5, Duration::from_millis(250))?;
//! let tokens = TokenManager::new(session.clone(), endpoint, 0);
//! let service = OAuthService::new(config, session, exchanger, tokens);
//!
//! let url = service.begin_login(String::new(), LoginHints::default())?;
//! // ... browser visits `url`, provider redirects back with code + state ...
//! let login = service.complete_login("code", "state").await?;
//! # let _ = (url, login);
//! # Ok(())
//! # }
//! ```
//!
//! # Security Notes
//!
//! - The verifier never leaves the process; only its challenge is sent out.
//! - Callback state is compared in constant time before any network call.
//! - ID token claims are decoded without signature verification (see
//!   [`jwt`]).

pub mod authorize;
pub mod client;
pub mod exchange;
pub mod jwt;
pub mod pkce;
pub mod service;
pub mod session;
pub mod token_manager;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
pub use authorize::{build_authorize_url, AuthorizeError};
pub use client::{OAuthClient, OAuthClientError};
pub use exchange::{CodeExchanger, TokenExchangeError, MAX_EXCHANGE_ATTEMPTS};
pub use jwt::{decode_claims_unverified, verify_nonce, JwtError};
pub use pkce::{
    derive_code_challenge, generate_code_verifier, generate_state, validate_state, PkceError,
    PkcePair,
};
pub use service::{CompletedLogin, LoginError, OAuthService};
pub use session::{AuthSession, LoginAttempt, LoginHints, VerifiedCallback};
pub use token_manager::{RefreshFailure, TokenLookup, TokenManager};
pub use traits::TokenEndpoint;
pub use types::{InvalidExpiry, OAuthConfig, OAuthError, TokenEvent, TokenResponse, TokenSet};
