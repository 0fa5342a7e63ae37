//! Translate filename atoms into ripgrep glob arguments.

use globset::GlobBuilder;

use crate::error::{Error, Result};

/// Characters that mark a pattern as already being a glob
const GLOB_META: &[char] = &['*', '?', '['];

/// A filename filter extracted from the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub pattern: String,
    pub negated: bool,
    pub case_sensitive: bool,
}

/// Normalize a filename pattern into a glob.
///
/// Patterns that already contain a glob metacharacter pass through
/// unchanged; anything else matches as a substring of the file name.
pub fn normalize_glob(pattern: &str) -> String {
    if pattern.contains(GLOB_META) {
        pattern.to_string()
    } else {
        format!("*{}*", pattern)
    }
}

impl FileFilter {
    /// The `-g`/`--iglob` flag pair for this filter
    pub fn to_args(&self) -> Result<[String; 2]> {
        let glob = normalize_glob(&self.pattern);

        GlobBuilder::new(&glob)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| Error::unsupported(format!("bad file glob {:?}: {}", self.pattern, e)))?;

        let flag = if self.case_sensitive { "-g" } else { "--iglob" };
        let value = if self.negated {
            format!("!{}", glob)
        } else {
            glob
        };
        Ok([flag.to_string(), value])
    }
}
