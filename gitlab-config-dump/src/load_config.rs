/// `load_config` module: Loads a static YAML config and injects the GitLab token from the environment.
///
/// This module is the only place where user-supplied YAML is parsed and mapped to typed structs.
///
/// # Responsibilities
/// - Parse the YAML file into [`CliConfig`]
/// - Inject the `GITLAB_TOKEN` secret from the environment (or `.env`)
/// - Produce clear diagnostics: any failure in loading names the file and the failing step
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted YAML:
///
/// ```yaml
/// gitlab_url: https://gitlab.example.com
/// repository: acme/config-repo
/// branch: main
/// base_dir: tenant
/// output_dir: ./dump
/// ```
use anyhow::Result;
use gitlab_config_dump_core::export::ExportOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable holding the GitLab access token.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

fn default_branch() -> String {
    "master".to_string()
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    gitlab_url: String,
    repository: String,
    #[serde(default = "default_branch")]
    branch: String,
    #[serde(default)]
    base_dir: Option<String>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

/// Fully merged configuration for one run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub gitlab_url: String,
    pub token: String,
    pub repository: String,
    pub branch: String,
    pub base_dir: String,
    /// When set, every exported file is written below this directory.
    pub output_dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            base_dir: self.base_dir.clone(),
        }
    }
}

/// Loads a static YAML config file (no secrets) and injects the token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.gitlab_url.trim().is_empty() {
        error!(config_path = ?path_ref, "gitlab_url is empty");
        anyhow::bail!("gitlab_url must not be empty");
    }

    let token = match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.is_empty() => {
            info!("{TOKEN_ENV} found in env");
            token
        }
        Ok(_) => {
            error!("{TOKEN_ENV} environment variable is empty");
            anyhow::bail!("{TOKEN_ENV} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{TOKEN_ENV} environment variable not set");
            return Err(anyhow::anyhow!(
                "{TOKEN_ENV} environment variable not set: {e}"
            ));
        }
    };

    info!(
        gitlab_url = %raw.gitlab_url,
        repository = %raw.repository,
        branch = %raw.branch,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        gitlab_url: raw.gitlab_url,
        token,
        repository: raw.repository,
        branch: raw.branch,
        base_dir: raw.base_dir.unwrap_or_default(),
        output_dir: raw.output_dir,
    })
}
