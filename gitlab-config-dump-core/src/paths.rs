//! Directory layout of a configuration repository.
//!
//! Every lookup is made relative to an optional base directory inside the
//! repository, followed by one of the fixed category directory names below.
//! The names must match the repository layout exactly.

pub const RULES_DIRECTORY: &str = "rules";
pub const DATABASE_CONNECTIONS_DIRECTORY: &str = "database-connections";
pub const EMAIL_TEMPLATES_DIRECTORY: &str = "emails";
pub const PAGES_DIRECTORY: &str = "pages";
pub const CLIENTS_DIRECTORY: &str = "clients";
pub const CLIENTS_GRANTS_DIRECTORY: &str = "grants";
pub const CONNECTIONS_DIRECTORY: &str = "connections";
pub const RULES_CONFIGS_DIRECTORY: &str = "rules-configs";
pub const RESOURCE_SERVERS_DIRECTORY: &str = "resource-servers";

/// Normalized base directory prefix: empty, or relative with exactly one trailing `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseDir(String);

impl BaseDir {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `base + directory`, the path handed to the listing API.
    pub fn join(&self, directory: &str) -> String {
        format!("{}{}", self.0, directory)
    }
}

impl std::fmt::Display for BaseDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the prefix applied to every lookup.
///
/// A single leading `/` is dropped and a trailing `/` is added when missing;
/// an empty setting means no prefix at all.
pub fn base_dir(configured: &str) -> BaseDir {
    let mut dir = configured
        .strip_prefix('/')
        .unwrap_or(configured)
        .to_string();
    if !dir.is_empty() && !dir.ends_with('/') {
        dir.push('/');
    }
    BaseDir(dir)
}
