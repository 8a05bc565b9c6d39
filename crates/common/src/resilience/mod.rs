//! Resilience patterns for fault tolerance.
//!
//! Only bounded retry is provided. It is generic over the error type so the
//! token exchange can decide which failures are worth another attempt.

pub mod retry;

pub use retry::{
    policies, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy, RetryResult,
};
