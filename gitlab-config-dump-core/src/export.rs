//! High-level pipeline: resolve project → build configuration tree → download every file.
//!
//! # Responsibilities
//! - Atomic, fail-fast orchestration: the first failing lookup, listing, download or
//!   sink write ends the run with that error
//! - Downloads start only once the whole tree is known, and the report is returned
//!   only after every download and sink write has settled
//! - Logging throughout (see tracing events)
//!
//! # Navigation
//! - Main entrypoint: [`run_export`]
//! - Dry run: [`list_export_tree`]
//! - Supporting types: [`ExportOptions`], [`ExportReport`]

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::contract::{DownloadedFile, FileSink, ProjectId, RepositoryApi};
use crate::download::download_file;
use crate::error::Result;
use crate::listing::TreeScope;
use crate::locator::resolve_project;
use crate::paths::base_dir;
use crate::tree::{aggregate_tree, AggregateTree};

/// What to export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// `owner/name` or `scheme://host/owner/name`.
    pub repository: String,
    pub branch: String,
    /// Prefix inside the repository, as configured (normalized before use).
    pub base_dir: String,
}

/// Outcome of a completed export.
#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub project_id: ProjectId,
    pub branch: String,
    pub files: Vec<DownloadedFile>,
}

async fn resolve_scope<A>(api: &A, options: &ExportOptions) -> Result<TreeScope>
where
    A: RepositoryApi + ?Sized,
{
    let project_id = resolve_project(&options.repository, api).await?;
    Ok(TreeScope {
        project_id,
        branch: options.branch.clone(),
        base_dir: base_dir(&options.base_dir),
    })
}

/// Resolves the project and assembles its configuration tree without downloading anything.
pub async fn list_export_tree<A>(api: &A, options: &ExportOptions) -> Result<AggregateTree>
where
    A: RepositoryApi + ?Sized,
{
    let scope = resolve_scope(api, options).await?;
    aggregate_tree(api, &scope).await
}

pub async fn run_export<A, S>(api: &A, options: &ExportOptions, sink: &S) -> Result<ExportReport>
where
    A: RepositoryApi + ?Sized,
    S: FileSink + ?Sized,
{
    info!(repository = %options.repository, branch = %options.branch, "[EXPORT] Starting export");

    let scope = resolve_scope(api, options).await?;
    info!(project_id = %scope.project_id, "[EXPORT] Project resolved");

    let tree = aggregate_tree(api, &scope).await?;
    info!(files = tree.len(), "[EXPORT] Downloading configuration files");

    let downloads = tree.iter().map(|entry| {
        let scope = &scope;
        async move {
            let file = download_file(api, scope, entry).await?;
            sink.write(&file).await.map_err(|e| {
                error!(file = %file.file_name, error = %e, "[EXPORT][ERROR] Sink rejected file");
                e
            })?;
            Ok::<_, crate::error::ExportError>(file)
        }
    });
    let files = try_join_all(downloads).await?;

    let report = ExportReport {
        project_id: scope.project_id,
        branch: scope.branch,
        files,
    };
    match serde_json::to_string(&report.files.iter().map(|f| &f.file_name).collect::<Vec<_>>()) {
        Ok(json) => debug!(files = %json, "[EXPORT] Exported file list"),
        Err(e) => error!(error = ?e, "[EXPORT] Failed to serialize exported file list"),
    }
    info!(files = report.files.len(), "[EXPORT] Dump completed");
    Ok(report)
}
