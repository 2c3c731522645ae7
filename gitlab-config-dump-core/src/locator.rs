//! Resolves a human-given repository string into the project identifier the API requires.

use tracing::{debug, error, info};

use crate::contract::{ProjectId, RepositoryApi};
use crate::error::{ExportError, Result};

/// A repository reference in one of the two accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectReference {
    /// `owner/name`
    Path { owner: String, name: String },
    /// Five `/`-separated segments, typically `https://host/owner/name`.
    ///
    /// Only the last two segments are interpreted; `prefix` keeps the first three
    /// verbatim (joined by `/`) and is never validated as a URL.
    Long {
        prefix: String,
        owner: String,
        name: String,
    },
}

impl ProjectReference {
    pub fn parse(repository: &str) -> Result<Self> {
        let parts: Vec<&str> = repository.split('/').collect();
        match parts.as_slice() {
            [owner, name] => Ok(ProjectReference::Path {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            [first, second, third, owner, name] => Ok(ProjectReference::Long {
                prefix: format!("{first}/{second}/{third}"),
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ExportError::Parse(repository.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            ProjectReference::Path { owner, .. } | ProjectReference::Long { owner, .. } => owner,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProjectReference::Path { name, .. } | ProjectReference::Long { name, .. } => name,
        }
    }

    /// `owner/name`, compared verbatim against each project's namespaced path.
    pub fn path_with_namespace(&self) -> String {
        format!("{}/{}", self.owner(), self.name())
    }
}

/// Finds the accessible project whose namespaced path equals `owner/name` exactly.
pub async fn resolve_project<A>(repository: &str, api: &A) -> Result<ProjectId>
where
    A: RepositoryApi + ?Sized,
{
    let reference = ProjectReference::parse(repository).map_err(|e| {
        error!(repository, "Repository string has an unrecognized shape");
        e
    })?;
    let wanted = reference.path_with_namespace();
    info!(repository = %wanted, "Resolving project ID");

    let projects = api.list_member_projects().await.map_err(|e| {
        error!(error = %e, "Listing accessible projects failed");
        ExportError::Lookup(e)
    })?;

    let Some(projects) = projects else {
        error!(repository = %wanted, "Accessible projects lookup returned no result");
        return Err(ExportError::NotFound(wanted));
    };
    debug!(count = projects.len(), "Fetched accessible projects");

    match projects.iter().find(|p| p.path_with_namespace == wanted) {
        Some(project) => {
            info!(repository = %wanted, project_id = %project.id, "Resolved project ID");
            Ok(project.id)
        }
        None => {
            error!(repository = %wanted, "No accessible project matches repository");
            Err(ExportError::NotFound(wanted))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let reference = ProjectReference::parse("acme/config-repo").unwrap();
        assert_eq!(
            reference,
            ProjectReference::Path {
                owner: "acme".into(),
                name: "config-repo".into()
            }
        );
        assert_eq!(reference.path_with_namespace(), "acme/config-repo");
    }

    #[test]
    fn parses_url_form() {
        let reference = ProjectReference::parse("https://gitlab.example.com/acme/config-repo").unwrap();
        assert_eq!(
            reference,
            ProjectReference::Long {
                prefix: "https://gitlab.example.com".into(),
                owner: "acme".into(),
                name: "config-repo".into()
            }
        );
        assert_eq!(reference.path_with_namespace(), "acme/config-repo");
    }

    #[test]
    fn long_form_keeps_leading_segments_verbatim() {
        let reference = ProjectReference::parse("a/b/c/d/e").unwrap();
        assert_eq!(
            reference,
            ProjectReference::Long {
                prefix: "a/b/c".into(),
                owner: "d".into(),
                name: "e".into()
            }
        );
        assert_eq!(reference.path_with_namespace(), "d/e");
    }

    #[test]
    fn rejects_other_segment_counts() {
        for input in [
            "",
            "config-repo",
            "acme/group/config-repo",
            "gitlab.example.com/acme/config-repo/x",
            "https://gitlab.example.com/acme/group/config-repo",
        ] {
            let err = ProjectReference::parse(input).unwrap_err();
            assert!(matches!(err, ExportError::Parse(_)), "input: {input:?}");
        }
    }
}
