//! Workspace discovery and repository-name resolution.
//!
//! A workspace is an ordered list of root directories. Every directory
//! below a root that contains a marker entry (`.git` by default) is a
//! repository; the walk never descends into a repository or into hidden
//! directories.
//!
//! ## Modules
//!
//! - [`walker`] - Parallel directory walk reporting repository boundaries
//! - [`resolver`] - Partial evaluation of `repo:` atoms per repository
//! - [`suggest`] - Ranked repository-name completion

pub mod resolver;
pub mod suggest;
pub mod walker;

pub use resolver::{resolve_repo_atoms, resolve_workspace, Resolution, ResolvedWorkspace};
pub use suggest::{suggest_repositories, RepoSuggestion};
pub use walker::{walk_repositories, RepoWalk, Visit, WalkOptions};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A repository found below a workspace root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RepositoryRecord {
    /// Absolute path of the repository directory
    pub root_path: PathBuf,
    /// Path relative to the workspace root, `/`-separated; `.` for the root itself
    pub relative_name: String,
}

impl RepositoryRecord {
    pub fn new(workspace_root: &Path, path: &Path) -> Self {
        let relative_name = match path.strip_prefix(workspace_root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        };

        Self {
            root_path: path.to_path_buf(),
            relative_name,
        }
    }
}
