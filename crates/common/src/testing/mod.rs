//! Testing utilities and helpers
//!
//! - **[`fixtures`]**: token sets and unsigned ID tokens
//! - **[`mocks`]**: scripted [`crate::auth::TokenEndpoint`] implementation

pub mod fixtures;
pub mod mocks;

pub use mocks::MockTokenEndpoint;
