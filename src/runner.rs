//! Run the search executable.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::slice;
use tracing::debug;

use crate::error::{Error, Result};

/// Outcome of a search run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Exit status 0
    Matched,
    /// Exit status 1
    NoMatch,
}

impl SearchStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            SearchStatus::Matched => 0,
            SearchStatus::NoMatch => 1,
        }
    }
}

/// Spawns the search executable with inherited stdio
#[derive(Debug, Clone)]
pub struct Searcher {
    program: PathBuf,
}

impl Searcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run once with `args` followed by `roots`, blocking until the process exits
    pub fn run(&self, args: &[String], roots: &[PathBuf]) -> Result<SearchStatus> {
        let program = self.program.display().to_string();
        debug!(program = %program, ?args, ?roots, "running search");

        let status = Command::new(&self.program)
            .args(args)
            .args(roots)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        match status.code() {
            Some(0) => Ok(SearchStatus::Matched),
            Some(1) => Ok(SearchStatus::NoMatch),
            Some(code) => Err(Error::SubprocessFailure {
                program,
                status: format!("exited with status {}", code),
            }),
            None => Err(Error::SubprocessFailure {
                program,
                status: format!("was terminated ({})", status),
            }),
        }
    }

    /// Search `roots` (the current directory when empty).
    ///
    /// With `batch`, all roots go to a single run; otherwise each root gets
    /// its own run and the result is `Matched` if any of them matched.
    pub fn run_search(&self, args: &[String], roots: &[PathBuf], batch: bool) -> Result<SearchStatus> {
        if batch || roots.len() <= 1 {
            return self.run(args, roots);
        }

        let mut status = SearchStatus::NoMatch;
        for root in roots {
            if self.run(args, slice::from_ref(root))? == SearchStatus::Matched {
                status = SearchStatus::Matched;
            }
        }
        Ok(status)
    }
}
