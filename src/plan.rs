//! Turn a parsed query into the action the binary performs.

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::compile::{compile, CompiledInvocation};
use crate::error::Result;
use crate::query::Predicate;
use crate::workspace::{resolve_workspace, RepositoryRecord, Resolution};

/// Trailing command-line values split at the first `--`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Values forwarded to the search executable unchanged
    pub passthrough: Vec<String>,
    /// Query text, space-joined
    pub query: String,
}

impl CommandLine {
    /// `[flags... --] query...`; without `--` every value is query text
    pub fn split(args: &[String]) -> Self {
        match args.iter().position(|a| a == "--") {
            Some(i) => Self {
                passthrough: args[..i].to_vec(),
                query: args[i + 1..].join(" "),
            },
            None => Self {
                passthrough: Vec::new(),
                query: args.join(" "),
            },
        }
    }
}

/// What to do for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    /// Run the search executable with `args`, over `roots` (the current
    /// directory when empty)
    Search {
        invocation: CompiledInvocation,
        args: Vec<String>,
        roots: Vec<PathBuf>,
        /// Roots whose walk failed part way; their repositories may be missing
        #[serde(skip_serializing_if = "Vec::is_empty")]
        walk_failures: Vec<String>,
    },
    /// Print the paths of these repositories
    ListRepos {
        repos: Vec<RepositoryRecord>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        walk_failures: Vec<String>,
    },
    /// Nothing can match; exit with status 1
    NoMatch,
}

impl Plan {
    fn search(
        passthrough: &[String],
        invocation: CompiledInvocation,
        roots: Vec<PathBuf>,
        walk_failures: Vec<String>,
    ) -> Self {
        let mut args = passthrough.to_vec();
        args.extend(invocation.args());
        debug!(?args, roots = roots.len(), "compiled search");
        Plan::Search {
            invocation,
            args,
            roots,
            walk_failures,
        }
    }
}

/// Plan a simplified predicate.
///
/// `walk` is only called when the predicate mentions repositories; without
/// `repo:` atoms the search runs once from the current directory.
pub fn plan<F, I>(predicate: &Predicate, passthrough: &[String], walk: F) -> Result<Plan>
where
    F: FnOnce() -> I,
    I: IntoIterator<Item = Result<RepositoryRecord>>,
{
    if !predicate.has_repo_atoms() {
        let invocation = compile(predicate)?;
        return Ok(Plan::search(passthrough, invocation, Vec::new(), Vec::new()));
    }

    let mut resolved = resolve_workspace(predicate, walk());
    let walk_failures: Vec<String> = resolved.failures.drain(..).map(|e| e.to_string()).collect();

    match resolved.into_resolution() {
        Resolution::NoMatch => Ok(Plan::NoMatch),
        Resolution::Paths(repos) => Ok(Plan::ListRepos {
            repos,
            walk_failures,
        }),
        Resolution::Search { residual, repos } => {
            let invocation = compile(&residual)?;
            let roots = repos.into_iter().map(|r| r.root_path).collect();
            Ok(Plan::search(passthrough, invocation, roots, walk_failures))
        }
    }
}
