///
/// This module implements the CLI interface for gitlab-config-dump: command parsing,
/// argument exposure and the async entrypoint.
///
/// All pipeline logic (lookup, tree assembly, downloads) lives in the
/// [`gitlab-config-dump-core`] crate. This module is strictly CLI glue and orchestration.
///
/// ## How To Use
/// - For command-line users: use the installed `gitlab-config-dump` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`gitlab-config-dump-core`]: ../../gitlab-config-dump-core/
use crate::gitlab::GitLabClient;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use gitlab_config_dump_core::contract::FileSink;
use gitlab_config_dump_core::export::{list_export_tree, run_export};
use gitlab_config_dump_core::sink::{DirectorySink, LogSink};
use std::path::PathBuf;

/// CLI for gitlab-config-dump: export configuration-as-code files from GitLab.
#[derive(Parser)]
#[clap(
    name = "gitlab-config-dump",
    version,
    about = "Export the configuration-as-code files of a GitLab repository"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every configuration file of the configured repository and branch
    Export {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,

        /// Write the files below this directory (overrides `output_dir` from the config)
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the configuration file paths that an export would download
    Tree {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Export { config, output_dir } => {
            let config = load_config(config)?;
            let client = GitLabClient::from_config(&config)?;
            let options = config.export_options();

            let sink: Box<dyn FileSink> = match output_dir.or(config.output_dir) {
                Some(dir) => {
                    tracing::info!(command = "export", output_dir = %dir.display(), "Persisting exported files");
                    Box::new(DirectorySink::new(dir))
                }
                None => Box::new(LogSink),
            };

            tracing::info!(command = "export", repository = %options.repository, "Starting export");
            match run_export(&client, &options, sink.as_ref()).await {
                Ok(report) => {
                    tracing::info!(
                        command = "export",
                        project_id = %report.project_id,
                        files = report.files.len(),
                        "Export complete"
                    );
                    println!("dump completed: {} file(s)", report.files.len());
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "export", error = %e, "Export failed");
                    Err(anyhow::Error::new(e).context("Export failed"))
                }
            }
        }
        Commands::Tree { config } => {
            let config = load_config(config)?;
            let client = GitLabClient::from_config(&config)?;
            let options = config.export_options();

            let tree = list_export_tree(&client, &options).await.map_err(|e| {
                tracing::error!(command = "tree", error = %e, "Listing configuration tree failed");
                anyhow::Error::new(e).context("Listing configuration tree failed")
            })?;
            for path in tree.paths() {
                println!("{path}");
            }
            tracing::info!(command = "tree", files = tree.len(), "Tree listed");
            Ok(())
        }
    }
}
