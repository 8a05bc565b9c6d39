//! Inputs record shared between the listener and the notebook kernel.
//!
//! A small JSON document (`{"projects": [..], "tasks": [..], "port": ..}`)
//! at the path named by `ASDC_INPUT_FILE`. The listener writes its port at
//! startup and the project/task selection after each login; the notebook
//! reads it to find the listener.

use std::path::{Path, PathBuf};

use odm_auth_common::auth::LoginHints;
use odm_auth_domain::constants::{ENV_DEFAULT_PROJECTS, ENV_DEFAULT_TASKS, ENV_INPUT_FILE};
use odm_auth_domain::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Selection and listener port shared with the notebook kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputsRecord {
    /// Selected project ids.
    #[serde(default)]
    pub projects: Vec<u64>,
    /// Selected task ids.
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Port of the running listener.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl InputsRecord {
    /// Replace the selection with any non-empty part of `hints`.
    pub fn apply_hints(&mut self, hints: &LoginHints) {
        if !hints.projects.is_empty() {
            self.projects.clone_from(&hints.projects);
        }
        if !hints.tasks.is_empty() {
            self.tasks.clone_from(&hints.tasks);
        }
    }
}

/// Reads and updates the inputs record. Without a path every write is a
/// no-op and reads return the defaults.
#[derive(Debug, Clone)]
pub struct InputStore {
    path: Option<PathBuf>,
    defaults: InputsRecord,
}

impl InputStore {
    /// Store at `path`; `None` keeps everything in defaults.
    #[must_use]
    pub fn new(path: Option<PathBuf>, defaults: InputsRecord) -> Self {
        Self { path, defaults }
    }

    /// Store at `path`, with defaults taken from `ASDC_PROJECTS` and
    /// `ASDC_TASKS`.
    #[must_use]
    pub fn with_env_defaults(path: Option<PathBuf>) -> Self {
        let projects = std::env::var(ENV_DEFAULT_PROJECTS).unwrap_or_default();
        let tasks = std::env::var(ENV_DEFAULT_TASKS).unwrap_or_default();
        let hints = LoginHints::parse(&projects, &tasks);

        Self::new(path, InputsRecord { projects: hints.projects, tasks: hints.tasks, port: None })
    }

    /// Store at `ASDC_INPUT_FILE`, if set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_env_defaults(std::env::var_os(ENV_INPUT_FILE).map(PathBuf::from))
    }

    /// File backing the record.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current record. A missing or unreadable file yields the defaults.
    pub async fn read(&self) -> InputsRecord {
        let Some(path) = &self.path else {
            return self.defaults.clone();
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<InputsRecord>(&bytes) {
                Ok(record) => record,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "inputs record is not valid JSON");
                    self.defaults.clone()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => self.defaults.clone(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read inputs record");
                self.defaults.clone()
            }
        }
    }

    /// Record the listener port, keeping the selection.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Io` if the file cannot be written.
    pub async fn write_port(&self, port: u16) -> Result<()> {
        self.update(|record| record.port = Some(port)).await
    }

    /// Record the port together with the selection carried by a login.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Io` if the file cannot be written.
    pub async fn record_login(&self, port: u16, hints: &LoginHints) -> Result<()> {
        self.update(|record| {
            record.port = Some(port);
            record.apply_hints(hints);
        })
        .await
    }

    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut InputsRecord),
    {
        let Some(path) = &self.path else {
            debug!("no inputs record configured, skipping write");
            return Ok(());
        };

        let mut record = self.read().await;
        change(&mut record);
        write_atomically(path, &record).await.map_err(Into::into)
    }
}

async fn write_atomically(path: &Path, record: &InputsRecord) -> std::result::Result<(), InfraError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let body = serde_json::to_vec_pretty(record)?;
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, body).await?;
    tokio::fs::rename(&staging, path).await?;

    debug!(path = %path.display(), port = ?record.port, "inputs record written");
    Ok(())
}
