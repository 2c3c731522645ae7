//! # contract: the remote repository API consumed by the export pipeline
//!
//! This module defines a single trait ([`RepositoryApi`]) and the plain data types
//! it exchanges. The pipeline never talks HTTP itself: the CLI crate provides the
//! GitLab implementation, and tests use the `mockall`-generated [`MockRepositoryApi`].
//!
//! ## "No result" versus failure
//! - `Ok(None)` means the remote answered but has nothing at that location
//!   (a project list that came back empty-handed, a directory that does not exist yet).
//! - `Err(ApiError)` means the call itself failed and must be propagated.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall` so consumers can generate deterministic
//!   mocks for unit/integration tests (enabled by the default `test-export-mocks` feature).

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::ExportError;

/// Opaque project identifier handed out by the hosting API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the accessible-projects listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Namespaced path, e.g. `acme/config-repo`.
    pub path_with_namespace: String,
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// A file.
    Blob,
    /// A subdirectory.
    Tree,
    /// Anything else the remote may report (e.g. submodules).
    #[serde(other)]
    Other,
}

/// One entry of a (non-recursive) directory listing.
///
/// Listers overwrite `path` with the full repository-relative path they computed,
/// whatever the remote supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.entry_type == EntryType::Blob
    }

    pub fn is_tree(&self) -> bool {
        self.entry_type == EntryType::Tree
    }
}

/// Entries that survive into the aggregate tree are always blobs.
pub type FileEntry = TreeEntry;

/// Raw file payload as returned by the file-content API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFile {
    pub file_path: String,
    /// Content encoding; the hosting API always answers `base64`.
    #[serde(default)]
    pub encoding: String,
    pub content: String,
}

/// Error type for remote API calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{url} answered HTTP {status}")]
    Status { status: u16, url: String },

    #[error("unexpected response body: {0}")]
    Body(String),
}

/// The remote API surface the export pipeline consumes.
///
/// The trait is `Send` + `Sync` and intended for async/await usage; every pipeline
/// stage borrows one shared implementor for the whole run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// List projects the caller is a member of.
    async fn list_member_projects(&self) -> Result<Option<Vec<Project>>, ApiError>;

    /// List the immediate entries of `path` at `reference`. Never recursive.
    async fn list_tree(
        &self,
        project_id: ProjectId,
        reference: &str,
        path: &str,
    ) -> Result<Option<Vec<TreeEntry>>, ApiError>;

    /// Fetch one file's (base64-encoded) content at `reference`.
    async fn show_file(
        &self,
        project_id: ProjectId,
        path: &str,
        reference: &str,
    ) -> Result<RepositoryFile, ApiError>;
}

/// Decoded text content of one exported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
    /// Repository-relative path of the file.
    pub file_name: String,
    pub contents: String,
}

/// Destination for every downloaded file of a run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FileSink: Send + Sync {
    async fn write(&self, file: &DownloadedFile) -> Result<(), ExportError>;
}
