//! Aggregate configuration tree: every category listed concurrently, merged by path.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::contract::{FileEntry, RepositoryApi};
use crate::error::Result;
use crate::listing::{list_connections_tree, list_directory, TreeScope};
use crate::paths;

/// The logical configuration areas of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Rules,
    DatabaseConnections,
    EmailTemplates,
    Pages,
    Clients,
    ClientGrants,
    Connections,
    RulesConfigs,
    ResourceServers,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Rules,
        Category::DatabaseConnections,
        Category::EmailTemplates,
        Category::Pages,
        Category::Clients,
        Category::ClientGrants,
        Category::Connections,
        Category::RulesConfigs,
        Category::ResourceServers,
    ];

    pub fn directory(self) -> &'static str {
        match self {
            Category::Rules => paths::RULES_DIRECTORY,
            Category::DatabaseConnections => paths::DATABASE_CONNECTIONS_DIRECTORY,
            Category::EmailTemplates => paths::EMAIL_TEMPLATES_DIRECTORY,
            Category::Pages => paths::PAGES_DIRECTORY,
            Category::Clients => paths::CLIENTS_DIRECTORY,
            Category::ClientGrants => paths::CLIENTS_GRANTS_DIRECTORY,
            Category::Connections => paths::CONNECTIONS_DIRECTORY,
            Category::RulesConfigs => paths::RULES_CONFIGS_DIRECTORY,
            Category::ResourceServers => paths::RESOURCE_SERVERS_DIRECTORY,
        }
    }

    /// Lists the files belonging to this category.
    pub async fn list<A>(self, api: &A, scope: &TreeScope) -> Result<Vec<FileEntry>>
    where
        A: RepositoryApi + ?Sized,
    {
        let files = match self {
            Category::DatabaseConnections => list_connections_tree(api, scope).await?,
            other => list_directory(api, scope, other.directory()).await?,
        };
        debug!(category = ?self, count = files.len(), "Listed category");
        Ok(files)
    }
}

/// Set of exported files keyed by repository path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateTree {
    files: BTreeMap<String, FileEntry>,
}

impl AggregateTree {
    /// Adds an entry; an entry with an already present path is dropped.
    pub fn insert(&mut self, entry: FileEntry) -> bool {
        if self.files.contains_key(&entry.path) {
            return false;
        }
        self.files.insert(entry.path.clone(), entry);
        true
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }
}

impl FromIterator<FileEntry> for AggregateTree {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut tree = AggregateTree::default();
        for entry in iter {
            tree.insert(entry);
        }
        tree
    }
}

impl IntoIterator for AggregateTree {
    type Item = FileEntry;
    type IntoIter = std::collections::btree_map::IntoValues<String, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_values()
    }
}

/// Lists every category concurrently and unions the results.
///
/// All or nothing: the first failing listing fails the whole tree.
pub async fn aggregate_tree<A>(api: &A, scope: &TreeScope) -> Result<AggregateTree>
where
    A: RepositoryApi + ?Sized,
{
    aggregate_categories(api, scope, &Category::ALL).await
}

/// Lists the given categories concurrently and unions their files by path.
///
/// A path reported by more than one listing appears once, as first listed.
pub async fn aggregate_categories<A>(
    api: &A,
    scope: &TreeScope,
    categories: &[Category],
) -> Result<AggregateTree>
where
    A: RepositoryApi + ?Sized,
{
    info!(
        project_id = %scope.project_id,
        branch = %scope.branch,
        base_dir = %scope.base_dir,
        categories = categories.len(),
        "Building configuration tree"
    );
    let listings = categories.iter().map(|category| category.list(api, scope));
    let tree: AggregateTree = try_join_all(listings).await?.into_iter().flatten().collect();
    info!(count = tree.len(), "Configuration tree assembled");
    Ok(tree)
}
