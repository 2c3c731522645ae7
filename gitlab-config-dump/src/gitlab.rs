#![doc = "GitLab integration for CLI and core: implements the core `RepositoryApi` trait against the GitLab REST API."]
//
//! # GitLab client (CLI <-> Core)
//!
//! This module wires up the [`RepositoryApi`] contract from
//! `gitlab-config-dump-core` for real use against a GitLab instance (REST API v4).
//!
//! ## Client Usage
//!
//! - Construct [`GitLabClient`] from the loaded config (instance URL + access token).
//! - One client, and so one connection pool, is created per run and borrowed by every
//!   pipeline stage.
//! - All transport, pagination and status handling is encapsulated here; the core only
//!   sees `Ok(None)` for "nothing there" and [`ApiError`] for failed calls.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use gitlab_config_dump_core::contract::{
    ApiError, Project, ProjectId, RepositoryApi, RepositoryFile, TreeEntry,
};

use crate::load_config::CliConfig;

const TOKEN_HEADER: &str = "private-token";
const NEXT_PAGE_HEADER: &str = "x-next-page";
const PER_PAGE: &str = "100";

pub struct GitLabClient {
    http: Client,
    base_url: Url,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            tracing::error!(error = ?e, base_url, "Invalid GitLab URL");
            anyhow::anyhow!("Invalid GitLab URL {base_url:?}: {e}")
        })?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid GitLab URL {base_url}: not a base URL");
        }

        let mut token_value = HeaderValue::from_str(token)
            .map_err(|e| anyhow::anyhow!("GitLab token is not a valid header value: {e}"))?;
        token_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token_value);

        let http = Client::builder().default_headers(headers).build()?;
        tracing::info!(gitlab_url = %base_url, "Initialized GitLab client");
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &CliConfig) -> anyhow::Result<Self> {
        Self::new(&config.gitlab_url, &config.token)
    }

    /// `<base>/api/v4/<segments...>`, each segment percent-encoded on its own.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v4"]).extend(segments);
        }
        url
    }

    /// GET every page of a listing. A 404 means there is nothing at that location.
    async fn get_all_pages<T>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Option<Vec<T>>, ApiError>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = "1".to_string();
        loop {
            let response = self
                .http
                .get(url.clone())
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page.as_str())])
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(error = ?e, url = %url, "GitLab request failed");
                    ApiError::Transport(e.to_string())
                })?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                tracing::debug!(url = %url, "GitLab answered 404, no result");
                return Ok(None);
            }
            if !status.is_success() {
                tracing::error!(status = %status, url = %url, "GitLab returned error");
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let next_page = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let batch: Vec<T> = response.json().await.map_err(|e| {
                tracing::error!(error = ?e, url = %url, "Failed to decode GitLab listing");
                ApiError::Body(e.to_string())
            })?;
            items.extend(batch);

            match next_page {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(Some(items))
    }
}

#[async_trait]
impl RepositoryApi for GitLabClient {
    async fn list_member_projects(&self) -> Result<Option<Vec<Project>>, ApiError> {
        tracing::info!("Listing projects the token is a member of");
        let url = self.endpoint(&["projects"]);
        let projects: Option<Vec<Project>> = self
            .get_all_pages(url, &[("membership", "true"), ("simple", "true")])
            .await?;
        if let Some(projects) = &projects {
            tracing::info!(count = projects.len(), "Fetched member projects");
        }
        Ok(projects)
    }

    async fn list_tree(
        &self,
        project_id: ProjectId,
        reference: &str,
        path: &str,
    ) -> Result<Option<Vec<TreeEntry>>, ApiError> {
        tracing::debug!(%project_id, reference, path, "Listing repository tree");
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "repository", "tree"]);
        self.get_all_pages(url, &[("ref", reference), ("path", path)])
            .await
    }

    async fn show_file(
        &self,
        project_id: ProjectId,
        path: &str,
        reference: &str,
    ) -> Result<RepositoryFile, ApiError> {
        tracing::debug!(%project_id, reference, path, "Fetching repository file");
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "repository", "files", path]);

        let response = self
            .http
            .get(url.clone())
            .query(&[("ref", reference)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url = %url, "GitLab request failed");
                ApiError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, url = %url, path, "GitLab returned error for file");
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.json::<RepositoryFile>().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Failed to decode GitLab file");
            ApiError::Body(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GitLabClient {
        GitLabClient::new(base, "secret").unwrap()
    }

    #[test]
    fn endpoint_appends_api_prefix() {
        let url = client("https://gitlab.example.com").endpoint(&["projects"]);
        assert_eq!(url.as_str(), "https://gitlab.example.com/api/v4/projects");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = client("https://example.com/gitlab/").endpoint(&["projects", "7", "repository", "tree"]);
        assert_eq!(
            url.as_str(),
            "https://example.com/gitlab/api/v4/projects/7/repository/tree"
        );
    }

    #[test]
    fn endpoint_encodes_file_path_as_one_segment() {
        let url = client("https://gitlab.example.com")
            .endpoint(&["projects", "7", "repository", "files", "rules/a b.json"]);
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/7/repository/files/rules%2Fa%20b.json"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(GitLabClient::new("not a url", "secret").is_err());
        assert!(GitLabClient::new("mailto:ops@example.com", "secret").is_err());
    }

    #[test]
    fn decodes_gitlab_tree_entries() {
        let json = r#"[
            {"id": "a1", "name": "a.json", "type": "blob", "path": "rules/a.json", "mode": "100644"},
            {"id": "b2", "name": "users", "type": "tree", "path": "database-connections/users", "mode": "040000"},
            {"id": "c3", "name": "vendor", "type": "commit", "path": "vendor", "mode": "160000"}
        ]"#;
        let entries: Vec<TreeEntry> = serde_json::from_str(json).unwrap();
        assert!(entries[0].is_blob());
        assert!(entries[1].is_tree());
        assert!(!entries[2].is_blob() && !entries[2].is_tree());
    }
}
