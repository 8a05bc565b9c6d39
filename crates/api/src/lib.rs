//! # Notebook Auth Server
//!
//! Binary layer - command line, logging and wiring.
//!
//! This crate contains:
//! - Command line parsing and config overrides
//! - Application context (dependency injection)
//! - Tracing setup
//!
//! ## Architecture
//! - Depends on `domain`, `common` and `infra`
//! - `main.rs` only parses arguments, starts the listener and waits for
//!   Ctrl-C

pub mod cli;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use cli::Cli;
pub use context::AppContext;
