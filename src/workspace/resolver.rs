//! Partial evaluation of repository atoms against discovered repositories.

use tracing::{debug, warn};

use super::RepositoryRecord;
use crate::error::{Error, Result};
use crate::query::{simplify, Atom, Predicate};

/// Replace every `repo:` atom with whether `relative_name` contains its
/// pattern, then simplify. The input tree is not modified.
pub fn resolve_repo_atoms(predicate: &Predicate, relative_name: &str) -> Predicate {
    let mapped = predicate.map_atoms(&mut |atom| match atom {
        Atom::RepoName { pattern } => Predicate::constant(relative_name.contains(pattern.as_str())),
        other => Predicate::Atom(other.clone()),
    });
    simplify(&mapped)
}

/// Accumulated state of a workspace resolution
#[derive(Debug, Default)]
pub struct ResolvedWorkspace {
    /// First non-constant residual, or `true` while every survivor was repo-only
    pub residual: Option<Predicate>,
    /// Repositories whose residual was not `false`
    pub matching_repos: Vec<RepositoryRecord>,
    /// Walk errors, already logged
    pub failures: Vec<Error>,
}

/// What to do with a resolved workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No repository survived the repository filters
    NoMatch,
    /// The query only filtered repositories: print their paths
    Paths(Vec<RepositoryRecord>),
    /// Search the surviving repositories with the residual query
    Search {
        residual: Predicate,
        repos: Vec<RepositoryRecord>,
    },
}

impl ResolvedWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `predicate` for one repository. Returns false if it was pruned.
    pub fn add(&mut self, predicate: &Predicate, record: RepositoryRecord) -> bool {
        let residual = resolve_repo_atoms(predicate, &record.relative_name);

        match residual.as_const() {
            Some(false) => {
                debug!(repo = %record.relative_name, "pruned by repository filter");
                return false;
            }
            Some(true) => {
                if self.residual.is_none() {
                    self.residual = Some(residual);
                }
            }
            None => match &self.residual {
                Some(existing) if existing.as_const().is_none() => {
                    if *existing != residual {
                        warn!(
                            repo = %record.relative_name,
                            kept = %existing,
                            ignored = %residual,
                            "repositories resolve to different queries; using the first"
                        );
                    }
                }
                _ => self.residual = Some(residual),
            },
        }

        self.matching_repos.push(record);
        true
    }

    /// Record a walk error
    pub fn add_failure(&mut self, err: Error) {
        warn!("{}", err);
        self.failures.push(err);
    }

    /// Finish the walk and decide what to run
    pub fn into_resolution(mut self) -> Resolution {
        if self.matching_repos.is_empty() {
            return Resolution::NoMatch;
        }
        self.matching_repos.sort();

        match self.residual {
            None => Resolution::NoMatch,
            Some(residual) if residual.as_const().is_some() => Resolution::Paths(self.matching_repos),
            Some(residual) => Resolution::Search {
                residual,
                repos: self.matching_repos,
            },
        }
    }
}

/// Evaluate `predicate` against every repository produced by `walk`
pub fn resolve_workspace<I>(predicate: &Predicate, walk: I) -> ResolvedWorkspace
where
    I: IntoIterator<Item = Result<RepositoryRecord>>,
{
    let mut resolved = ResolvedWorkspace::new();
    for item in walk {
        match item {
            Ok(record) => {
                resolved.add(predicate, record);
            }
            Err(err) => resolved.add_failure(err),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_query;
    use std::path::PathBuf;

    fn record(name: &str) -> RepositoryRecord {
        RepositoryRecord {
            root_path: PathBuf::from("/ws").join(name),
            relative_name: name.to_string(),
        }
    }

    fn repos(names: &[&str]) -> Vec<Result<RepositoryRecord>> {
        names.iter().map(|n| Ok(record(n))).collect()
    }

    #[test]
    fn test_resolve_repo_atoms() {
        let q = parse_query("r:tools foo").unwrap();
        assert_eq!(resolve_repo_atoms(&q, "acme/tools"), Atom::substring("foo").into());
        assert_eq!(resolve_repo_atoms(&q, "acme/web"), Predicate::constant(false));
        // untouched
        assert!(q.has_repo_atoms());
    }

    #[test]
    fn test_negated_repo() {
        let q = parse_query("-r:vendor").unwrap();
        assert_eq!(resolve_repo_atoms(&q, "acme/vendor/x"), Predicate::constant(false));
        assert_eq!(resolve_repo_atoms(&q, "acme/tools"), Predicate::constant(true));
    }

    #[test]
    fn test_repo_only_query_lists_paths() {
        let q = parse_query("r:acme").unwrap();
        let resolved = resolve_workspace(&q, repos(&["other/x", "acme/b", "acme/a"]));
        assert_eq!(
            resolved.into_resolution(),
            Resolution::Paths(vec![record("acme/a"), record("acme/b")])
        );
    }

    #[test]
    fn test_search_residual() {
        let q = parse_query("r:acme foo -f:test").unwrap();
        let resolved = resolve_workspace(&q, repos(&["acme/a", "other/x", "acme/b"]));
        match resolved.into_resolution() {
            Resolution::Search { residual, repos } => {
                assert!(!residual.has_repo_atoms());
                assert_eq!(residual, parse_query("foo -f:test").unwrap());
                assert_eq!(repos, vec![record("acme/a"), record("acme/b")]);
            }
            other => panic!("Expected Search, got {:?}", other),
        }
    }

    #[test]
    fn test_no_repository_survives() {
        let q = parse_query("r:nothing foo").unwrap();
        let resolved = resolve_workspace(&q, repos(&["acme/a", "acme/b"]));
        assert_eq!(resolved.into_resolution(), Resolution::NoMatch);
    }

    #[test]
    fn test_empty_workspace() {
        let q = parse_query("r:x").unwrap();
        assert_eq!(resolve_workspace(&q, repos(&[])).into_resolution(), Resolution::NoMatch);
    }

    #[test]
    fn test_alternative_repos() {
        let q = parse_query("(r:web or r:api) handler").unwrap();
        let resolved = resolve_workspace(&q, repos(&["acme/web", "acme/api", "acme/db"]));
        match resolved.into_resolution() {
            Resolution::Search { residual, repos } => {
                assert_eq!(residual, Atom::substring("handler").into());
                assert_eq!(repos.len(), 2);
            }
            other => panic!("Expected Search, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_and_search_residuals_union() {
        // acme/web resolves to true, the others to "handler"
        let q = parse_query("r:web or handler").unwrap();
        let resolved = resolve_workspace(&q, repos(&["acme/web", "acme/api"]));
        match resolved.into_resolution() {
            Resolution::Search { residual, repos } => {
                assert_eq!(residual, Atom::substring("handler").into());
                assert_eq!(repos, vec![record("acme/api"), record("acme/web")]);
            }
            other => panic!("Expected Search, got {:?}", other),
        }
    }

    #[test]
    fn test_failures_are_collected() {
        let q = parse_query("r:a").unwrap();
        let walk = vec![
            Ok(record("a")),
            Err(Error::WalkFailure {
                root: PathBuf::from("/missing"),
                source: ignore::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
            }),
        ];
        let resolved = resolve_workspace(&q, walk);
        assert_eq!(resolved.failures.len(), 1);
        assert_eq!(resolved.into_resolution(), Resolution::Paths(vec![record("a")]));
    }
}
