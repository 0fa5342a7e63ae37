//! Error taxonomy shared by the compiler, the workspace walker and the runner.

use std::io;
use std::path::PathBuf;

/// Errors produced while turning a query into search invocations.
///
/// "No match" is deliberately absent: zero surviving repositories or a
/// search that finds nothing is reported through exit status 1, not here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query text could not be parsed, or a regex atom is invalid.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The predicate uses a shape the search tool's argument grammar cannot express.
    #[error("unsupported query: {0}")]
    UnsupportedPredicate(String),

    /// Reading a directory below a workspace root failed.
    #[error("walking {}: {source}", root.display())]
    WalkFailure {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },

    /// The search executable could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The search executable ended with something other than "matched" or "no match".
    #[error("{program} {status}")]
    SubprocessFailure { program: String, status: String },
}

impl Error {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedPredicate(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
