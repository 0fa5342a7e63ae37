//! Predicate → ripgrep argument compiler.
//!
//! Only a flat subset of the query language can be expressed as a single
//! ripgrep invocation: a top-level conjunction of content atoms (joined into
//! one regex), file globs (optionally negated) and constants. Anything else
//! is rejected with [`Error::UnsupportedPredicate`] rather than dropped.
//!
//! ```
//! use rgq::compile::compile;
//! use rgq::query::parse_query;
//!
//! let q = parse_query("foo f:bar*.go case:yes").unwrap();
//! assert_eq!(compile(&q).unwrap().args(), ["-g", "bar*.go", "-e", "foo"]);
//! ```

pub mod case;
pub mod glob;
pub mod pattern;

pub use case::CaseDirective;
pub use glob::{normalize_glob, FileFilter};
pub use pattern::{compose, ContentTerm, LAZY_GAP};

use serde::Serialize;
use std::slice;

use crate::error::{Error, Result};
use crate::query::{Atom, Predicate};

/// ripgrep arguments for one search target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledInvocation {
    /// Glob flags (in atom order) followed by the case flag
    pub flags: Vec<String>,
    /// List matching file paths instead of matching lines
    pub list_files_only: bool,
    /// The combined line pattern, absent when listing files
    pub combined_pattern: Option<String>,
}

impl CompiledInvocation {
    /// Full argument sequence: flags, then `--files` or `-e PATTERN` last
    pub fn args(&self) -> Vec<String> {
        let mut args = self.flags.clone();
        match &self.combined_pattern {
            Some(pattern) => {
                args.push("-e".to_string());
                args.push(pattern.clone());
            }
            None => args.push("--files".to_string()),
        }
        args
    }
}

/// A content atom with its resolved case sensitivity
struct ContentAtom<'a> {
    pattern: &'a str,
    literal: bool,
    case_sensitive: bool,
}

/// Compile a simplified predicate into ripgrep arguments
pub fn compile(predicate: &Predicate) -> Result<CompiledInvocation> {
    let children = match predicate {
        Predicate::And(children) => children.as_slice(),
        other => slice::from_ref(other),
    };

    let mut file_filters = Vec::new();
    let mut content = Vec::new();

    for child in children {
        let (negated, node) = match child {
            Predicate::Not(inner) => (true, inner.as_ref()),
            other => (false, other),
        };

        let atom = match node {
            Predicate::Atom(atom) => atom,
            Predicate::And(_) => return Err(Error::unsupported(format!("nested group {}", node))),
            Predicate::Or(_) => {
                return Err(Error::unsupported(format!("alternatives are not supported: {}", node)));
            }
            Predicate::Not(_) => return Err(Error::unsupported(format!("double negation {}", child))),
        };

        match atom {
            Atom::Glob { pattern, case } => file_filters.push(FileFilter {
                pattern: pattern.clone(),
                negated,
                case_sensitive: case.is_sensitive(pattern),
            }),
            Atom::Substring {
                pattern,
                case,
                file_scoped: true,
            } => file_filters.push(FileFilter {
                pattern: pattern.clone(),
                negated,
                case_sensitive: case.is_sensitive(pattern),
            }),
            Atom::Regexp {
                file_scoped: true, ..
            } => {
                return Err(Error::unsupported(format!(
                    "file name regex cannot be expressed as a glob: {}",
                    atom
                )));
            }
            Atom::Substring { .. } | Atom::Regexp { .. } if negated => {
                return Err(Error::unsupported(format!(
                    "negated content patterns are not supported: {}",
                    child
                )));
            }
            Atom::Substring { pattern, case, .. } => content.push(ContentAtom {
                pattern,
                literal: true,
                case_sensitive: case.is_sensitive(pattern),
            }),
            Atom::Regexp { pattern, case, .. } => content.push(ContentAtom {
                pattern,
                literal: false,
                case_sensitive: case.is_sensitive_regex(pattern),
            }),
            Atom::RepoName { .. } => {
                return Err(Error::unsupported(format!(
                    "repository filter must be resolved before compiling: {}",
                    atom
                )));
            }
            Atom::Const(value) => {
                if *value == negated {
                    return Err(Error::unsupported("query can never match"));
                }
            }
        }
    }

    let mut flags = Vec::with_capacity(file_filters.len() * 2 + 1);
    for filter in &file_filters {
        flags.extend(filter.to_args()?);
    }

    let sensitivities: Vec<bool> = content.iter().map(|c| c.case_sensitive).collect();
    let Some(directive) = CaseDirective::from_sensitivities(&sensitivities) else {
        return Ok(CompiledInvocation {
            flags,
            list_files_only: true,
            combined_pattern: None,
        });
    };

    if let Some(flag) = directive.global_flag() {
        flags.push(flag.to_string());
    }

    let terms: Vec<ContentTerm> = content
        .iter()
        .map(|c| ContentTerm {
            pattern: c.pattern.to_string(),
            literal: c.literal,
            fold_case: directive.wraps(c.case_sensitive),
        })
        .collect();

    Ok(CompiledInvocation {
        flags,
        list_files_only: false,
        combined_pattern: compose(&terms)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{parse_query, CaseMode};

    fn args(query: &str) -> Vec<String> {
        let q = parse_query(query).unwrap();
        compile(&q).unwrap().args()
    }

    fn compile_err(query: &str) -> Error {
        let q = parse_query(query).unwrap();
        compile(&q).unwrap_err()
    }

    #[test]
    fn test_single_term() {
        assert_eq!(args("foo"), ["-i", "-e", "foo"]);
    }

    #[test]
    fn test_two_terms() {
        assert_eq!(args("foo bar"), ["-i", "-e", "foo.*?bar"]);
    }

    #[test]
    fn test_case_yes() {
        assert_eq!(args("foo bar case:yes"), ["-e", "foo.*?bar"]);
    }

    #[test]
    fn test_case_no_overrides_uppercase() {
        assert_eq!(args("Foo case:no"), ["-i", "-e", "Foo"]);
    }

    #[test]
    fn test_mixed_case() {
        assert_eq!(args("foo Bar"), ["-e", "(?i:foo).*?Bar"]);
    }

    #[test]
    fn test_regex_term() {
        assert_eq!(args("foo.*bar"), ["-i", "-e", "foo.*bar"]);
    }

    #[test]
    fn test_regex_escape_does_not_trigger_case() {
        assert_eq!(args(r"foo\S+"), ["-i", "-e", r"foo\S+"]);
        assert_eq!(args(r"\p{Greek}x"), ["-i", "-e", r"\p{Greek}x"]);
    }

    #[test]
    fn test_file_only() {
        assert_eq!(args("f:bar"), ["--iglob", "*bar*", "--files"]);
    }

    #[test]
    fn test_file_and_negated_file() {
        assert_eq!(
            args("f:bar -f:baz"),
            ["--iglob", "*bar*", "--iglob", "!*baz*", "--files"]
        );
    }

    #[test]
    fn test_file_glob_case_yes() {
        assert_eq!(args("foo f:bar*.go case:yes"), ["-g", "bar*.go", "-e", "foo"]);
    }

    #[test]
    fn test_flag_order_is_files_then_case_then_pattern() {
        assert_eq!(
            args("foo f:a -f:b bar"),
            ["--iglob", "*a*", "--iglob", "!*b*", "-i", "-e", "foo.*?bar"]
        );
    }

    #[test]
    fn test_uniform_case_has_no_inline_markers() {
        for query in ["foo bar baz", "Foo Bar", "foo Bar case:yes", "FOO bar case:no"] {
            let compiled = compile(&parse_query(query).unwrap()).unwrap();
            let pattern = compiled.combined_pattern.unwrap();
            assert!(!pattern.contains("(?i:"), "{} -> {}", query, pattern);
            assert!(compiled.flags.iter().filter(|f| *f == "-i").count() <= 1);
        }
    }

    #[test]
    fn test_mixed_case_wraps_each_insensitive_atom() {
        let compiled = compile(&parse_query("alpha Beta gamma").unwrap()).unwrap();
        assert!(compiled.flags.is_empty());
        assert_eq!(
            compiled.combined_pattern.as_deref(),
            Some("(?i:alpha).*?Beta.*?(?i:gamma)")
        );
    }

    #[test]
    fn test_file_scoped_substring_is_a_glob() {
        let q = Predicate::And(vec![
            Atom::Substring {
                pattern: "Makefile".to_string(),
                case: CaseMode::Auto,
                file_scoped: true,
            }
            .into(),
            Atom::substring("all").into(),
        ]);
        assert_eq!(compile(&q).unwrap().args(), ["-g", "*Makefile*", "-i", "-e", "all"]);
    }

    #[test]
    fn test_file_scoped_regex_rejected() {
        let q: Predicate = Atom::Regexp {
            pattern: r"\.rs$".to_string(),
            case: CaseMode::Auto,
            file_scoped: true,
        }
        .into();
        assert!(matches!(compile(&q), Err(Error::UnsupportedPredicate(_))));
    }

    #[test]
    fn test_negated_content_rejected() {
        assert!(matches!(compile_err("foo -bar"), Error::UnsupportedPredicate(_)));
        assert!(matches!(compile_err("foo -ba.r"), Error::UnsupportedPredicate(_)));
    }

    #[test]
    fn test_or_rejected() {
        assert!(matches!(compile_err("foo or bar"), Error::UnsupportedPredicate(_)));
    }

    #[test]
    fn test_negated_group_rejected() {
        assert!(matches!(compile_err("-(f:a f:b)"), Error::UnsupportedPredicate(_)));
    }

    #[test]
    fn test_repo_atom_rejected() {
        assert!(matches!(compile_err("r:tools foo"), Error::UnsupportedPredicate(_)));
    }

    #[test]
    fn test_constants() {
        assert_eq!(compile(&Predicate::constant(true)).unwrap().args(), ["--files"]);
        assert!(compile(&Predicate::constant(false)).is_err());
        let q = Predicate::And(vec![
            Predicate::negate(Predicate::constant(false)),
            Atom::substring("x").into(),
        ]);
        assert_eq!(compile(&q).unwrap().args(), ["-i", "-e", "x"]);
    }

    #[test]
    fn test_pattern_is_separate_argument() {
        let compiled = compile(&parse_query("foo bar").unwrap()).unwrap();
        let args = compiled.args();
        assert_eq!(args.last().map(String::as_str), Some("foo.*?bar"));
        assert_eq!(args[args.len() - 2], "-e");
        assert!(!compiled.list_files_only);
    }

    #[test]
    fn test_no_content_lists_files() {
        let compiled = compile(&parse_query("-f:vendor").unwrap()).unwrap();
        assert!(compiled.list_files_only);
        assert_eq!(compiled.combined_pattern, None);
        assert_eq!(compiled.args(), ["--iglob", "!*vendor*", "--files"]);
    }
}
