//! OAuth building blocks shared by the notebook auth crates.
//!
//! # Feature Tiers
//!
//! - `runtime`: async infrastructure (bounded retry)
//! - `platform`: OAuth flow (PKCE, authorization URL, token endpoint, session)
//! - `test-utils`: scripted mocks and fixtures for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "platform")))]
pub mod testing;

#[cfg(feature = "runtime")]
pub use resilience::{
    RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
    RetryResult,
};
