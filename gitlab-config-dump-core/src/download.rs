use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, error};

use crate::contract::{DownloadedFile, FileEntry, RepositoryApi};
use crate::error::{ExportError, Result};
use crate::listing::TreeScope;

/// Fetches one file at the run's branch and decodes its base64 content to text.
pub async fn download_file<A>(api: &A, scope: &TreeScope, entry: &FileEntry) -> Result<DownloadedFile>
where
    A: RepositoryApi + ?Sized,
{
    let file = api
        .show_file(scope.project_id, &entry.path, &scope.branch)
        .await
        .map_err(|e| {
            error!(path = %entry.path, error = %e, "File download failed");
            ExportError::Download {
                path: entry.path.clone(),
                source: e,
            }
        })?;

    let contents = decode_content(&file.content).map_err(|reason| {
        error!(path = %entry.path, %reason, "File content is not valid base64");
        ExportError::Decode {
            path: entry.path.clone(),
            reason,
        }
    })?;
    debug!(path = %entry.path, bytes = contents.len(), "Downloaded file");

    Ok(DownloadedFile {
        file_name: entry.path.clone(),
        contents,
    })
}

/// Base64 to text; line breaks inside the payload are ignored and invalid UTF-8 is replaced.
pub fn decode_content(content: &str) -> std::result::Result<String, String> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| e.to_string())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
