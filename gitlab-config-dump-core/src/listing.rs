//! Directory listers.
//!
//! The remote listing API is not recursive, so every category directory is listed on
//! its own. Database connections live one subdirectory per connection and need a
//! second level of listing to reach their files.

use futures::future::try_join_all;
use tracing::{debug, error};

use crate::contract::{FileEntry, ProjectId, RepositoryApi, TreeEntry};
use crate::error::{ExportError, Result};
use crate::paths::{BaseDir, DATABASE_CONNECTIONS_DIRECTORY};

/// Everything a lister or downloader needs to know about the current run.
#[derive(Debug, Clone)]
pub struct TreeScope {
    pub project_id: ProjectId,
    pub branch: String,
    pub base_dir: BaseDir,
}

/// A connection directory holds one script plus its settings; nothing else is exported.
pub fn is_connection_file(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".js") || file_name == "settings.json"
}

/// Lists `path`, mapping an absent directory to an empty listing.
async fn list_entries<A>(api: &A, scope: &TreeScope, path: &str) -> Result<Vec<TreeEntry>>
where
    A: RepositoryApi + ?Sized,
{
    match api.list_tree(scope.project_id, &scope.branch, path).await {
        Ok(Some(entries)) => {
            debug!(path, count = entries.len(), "Listed directory");
            Ok(entries)
        }
        Ok(None) => {
            debug!(path, "No result for directory, treating as empty");
            Ok(Vec::new())
        }
        Err(e) => {
            error!(path, error = %e, "Directory listing failed");
            Err(ExportError::Listing {
                path: path.to_string(),
                source: e,
            })
        }
    }
}

/// Lists the files directly inside one category directory.
pub async fn list_directory<A>(api: &A, scope: &TreeScope, directory: &str) -> Result<Vec<FileEntry>>
where
    A: RepositoryApi + ?Sized,
{
    let path = scope.base_dir.join(directory);
    let files = list_entries(api, scope, &path)
        .await?
        .into_iter()
        .filter(TreeEntry::is_blob)
        .map(|mut entry| {
            entry.path = format!("{path}/{}", entry.name);
            entry
        })
        .collect();
    Ok(files)
}

/// Lists the script and settings files of one database connection.
pub async fn list_connection_subdir<A>(
    api: &A,
    scope: &TreeScope,
    subdir: &str,
) -> Result<Vec<FileEntry>>
where
    A: RepositoryApi + ?Sized,
{
    let path = format!(
        "{}/{subdir}",
        scope.base_dir.join(DATABASE_CONNECTIONS_DIRECTORY)
    );
    let files = list_entries(api, scope, &path)
        .await?
        .into_iter()
        .filter(|entry| entry.is_blob() && is_connection_file(&entry.name))
        .map(|mut entry| {
            entry.path = format!("{path}/{}", entry.name);
            entry
        })
        .collect();
    Ok(files)
}

/// Lists every connection subdirectory concurrently and flattens their files.
pub async fn list_connections_tree<A>(api: &A, scope: &TreeScope) -> Result<Vec<FileEntry>>
where
    A: RepositoryApi + ?Sized,
{
    let root = scope.base_dir.join(DATABASE_CONNECTIONS_DIRECTORY);
    let subdirs: Vec<TreeEntry> = list_entries(api, scope, &root)
        .await?
        .into_iter()
        .filter(TreeEntry::is_tree)
        .collect();
    debug!(path = %root, count = subdirs.len(), "Found connection subdirectories");

    let listings = subdirs
        .iter()
        .map(|subdir| list_connection_subdir(api, scope, &subdir.name));
    let files: Vec<FileEntry> = try_join_all(listings).await?.into_iter().flatten().collect();
    debug!(path = %root, count = files.len(), "Assembled connection files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_file_allowlist() {
        assert!(is_connection_file("handler.js"));
        assert!(is_connection_file("handler.JS"));
        assert!(is_connection_file("settings.json"));
        assert!(!is_connection_file("README.md"));
        assert!(!is_connection_file("handler.JS.bak"));
        assert!(!is_connection_file("Settings.json"));
        assert!(!is_connection_file("other.json"));
    }
}
