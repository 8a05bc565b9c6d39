//! Notebook-side access to the callback listener.

mod client;

pub use client::{NotebookAuth, NotebookClient};
pub use crate::server::TokenStatus;
