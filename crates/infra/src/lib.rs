//! # Notebook Auth Infrastructure
//!
//! The impure half of the notebook auth workspace.
//!
//! This crate contains:
//! - Configuration loading (`.env`, environment variables, TOML/JSON files)
//! - The inputs record shared with the notebook kernel
//! - The axum callback listener (`/`, `/redirect`, `/callback`, `/tokens`)
//! - The notebook-side client that polls the listener for tokens
//!
//! ## Architecture
//! - Builds on the OAuth flow in `odm-auth-common::auth`
//! - Reports failures at its boundary as `odm_auth_domain::OdmAuthError`

pub mod config;
pub mod errors;
pub mod inputs;
pub mod notebook;
pub mod server;
pub mod service;

// Re-export commonly used items
pub use errors::InfraError;
pub use inputs::{InputStore, InputsRecord};
pub use notebook::{NotebookAuth, NotebookClient, TokenStatus};
pub use server::{router, AppState, CallbackServer};
pub use service::{build_service, connect};
