//! Destinations for downloaded files.
//!
//! [`LogSink`] only reports each file; [`DirectorySink`] persists it under a local
//! directory at its repository path.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::contract::{DownloadedFile, FileSink};
use crate::error::{ExportError, Result};

/// Reports every file, contents included, as an INFO event and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl FileSink for LogSink {
    async fn write(&self, file: &DownloadedFile) -> Result<()> {
        info!(
            file = %file.file_name,
            bytes = file.contents.len(),
            contents = %file.contents,
            "Downloaded file"
        );
        Ok(())
    }
}

/// Writes every file to `root/<repository path>`, creating directories as needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local destination of `file_name`; only plain relative components are accepted.
    pub fn target_path(&self, file_name: &str) -> Result<PathBuf> {
        let relative = Path::new(file_name);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return Err(ExportError::Write {
                path: file_name.to_string(),
                reason: "not a plain relative path".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn write(&self, file: &DownloadedFile) -> Result<()> {
        let target = self.target_path(&file.file_name)?;
        let write_error = |e: std::io::Error| {
            error!(error = ?e, path = %target.display(), "Failed to write exported file");
            ExportError::Write {
                path: file.file_name.clone(),
                reason: e.to_string(),
            }
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&target, file.contents.as_bytes())
            .await
            .map_err(write_error)?;
        debug!(path = %target.display(), "Wrote exported file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_path_joins_repository_path() {
        let sink = DirectorySink::new("/tmp/dump");
        assert_eq!(
            sink.target_path("database-connections/db/login.js").unwrap(),
            PathBuf::from("/tmp/dump/database-connections/db/login.js")
        );
    }

    #[test]
    fn target_path_rejects_escapes() {
        let sink = DirectorySink::new("/tmp/dump");
        for name in ["../etc/passwd", "/etc/passwd", "rules/../../x", "./rules/a.json", ""] {
            assert!(
                matches!(sink.target_path(name), Err(ExportError::Write { .. })),
                "name: {name:?}"
            );
        }
    }
}
