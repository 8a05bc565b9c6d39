//! Configuration loading and management
//!
//! This module provides utilities for loading listener configuration
//! from `.env` files, environment variables and config files.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    from_lookup, load, load_dotenv, load_from_env, load_from_file, oauth_config,
    probe_config_paths, validate,
};
