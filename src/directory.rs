//! Recipient resolution.
//!
//! The directory itself is an external collaborator behind the
//! [`RecipientDirectory`] trait; this module provides the pure preference
//! filter applied to whatever the directory returns, plus a JSON-file-backed
//! implementation used by the binary.

use crate::core::{Channel, Recipient, RecipientDirectory};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the file-backed recipient directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read recipients file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse recipients file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Filters the directory listing down to recipients that can actually be
/// notified, pairing each with their enabled channel set.
///
/// Anonymous/system accounts and recipients with no channels enabled are
/// dropped.
pub fn resolve_recipients(recipients: Vec<Recipient>) -> Vec<(Recipient, Vec<Channel>)> {
    recipients
        .into_iter()
        .filter(|r| !r.is_anonymous && !r.channels.is_empty())
        .map(|r| {
            let channels = r.channels.clone();
            (r, channels)
        })
        .collect()
}

/// A [`RecipientDirectory`] backed by a JSON file holding an array of
/// [`Recipient`] records. The file is re-read on every flush so preference
/// edits take effect without a restart.
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecipientDirectory for FileDirectory {
    async fn list_recipients(&self) -> Result<Vec<Recipient>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| DirectoryError::Io {
                path: self.path.clone(),
                source,
            })?;
        let recipients =
            serde_json::from_slice(&bytes).map_err(|source| DirectoryError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(recipients)
    }
}
