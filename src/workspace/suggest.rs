//! Repository-name completion.

use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use super::RepositoryRecord;
use crate::error::Result;

/// A repository matching a partial name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoSuggestion {
    pub name: String,
    pub path: PathBuf,
    /// Distance of the last match from the end of the name; lower ranks first
    pub score: usize,
}

/// Rank repositories whose relative name contains `query`.
///
/// Matches near the end of the name rank first (`tools` prefers
/// `acme/tools` over `tools/legacy`), ties are broken by name. With a
/// `limit`, the walk is abandoned as soon as that many matches are found.
pub fn suggest_repositories<I>(walk: I, query: &str, limit: Option<usize>) -> Vec<RepoSuggestion>
where
    I: IntoIterator<Item = Result<RepositoryRecord>>,
{
    let mut suggestions = Vec::new();

    for item in walk {
        let record = match item {
            Ok(record) => record,
            Err(err) => {
                warn!("{}", err);
                continue;
            }
        };

        if let Some(idx) = record.relative_name.rfind(query) {
            suggestions.push(RepoSuggestion {
                score: record.relative_name.len() - idx,
                name: record.relative_name,
                path: record.root_path,
            });
            if limit.is_some_and(|n| suggestions.len() >= n) {
                break;
            }
        }
    }

    suggestions.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.name.cmp(&b.name)));
    suggestions
}
