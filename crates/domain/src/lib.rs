//! # ODM Auth Domain
//!
//! Shared error and configuration types for the notebook OAuth listener.
//!
//! This crate contains:
//! - The crate-boundary error type and `Result` alias
//! - Configuration structures for the identity provider and the listener
//! - Environment variable names and defaults
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
