//! Compose content atoms into a single ordered regular expression.
//!
//! Terms are joined by a lazy gap (`.*?`), so the result matches a line
//! containing every term, in query order. The composition is built as a
//! small expression tree, simplified, then rendered.

use regex_syntax::ast::parse::Parser;
use regex_syntax::ast::Ast;

use crate::error::{Error, Result};

/// Shortest run of non-newline characters between two terms
pub const LAZY_GAP: &str = ".*?";

/// A content atom ready for composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTerm {
    pub pattern: String,
    /// Literal text (escaped) rather than a regular expression (verbatim)
    pub literal: bool,
    /// Wrap in an inline case-insensitive group
    pub fold_case: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    Literal(String),
    /// Verbatim regex; `grouped` when it must be parenthesized next to other fragments
    Raw { pattern: String, grouped: bool },
    Gap,
    FoldCase(Box<Fragment>),
    Concat(Vec<Fragment>),
}

impl Fragment {
    fn is_empty(&self) -> bool {
        match self {
            Fragment::Literal(s) => s.is_empty(),
            Fragment::Raw { pattern, .. } => pattern.is_empty(),
            Fragment::Concat(parts) => parts.is_empty(),
            Fragment::FoldCase(inner) => inner.is_empty(),
            Fragment::Gap => false,
        }
    }
}

/// Compose terms into one pattern. `Ok(None)` when there are no terms.
pub fn compose(terms: &[ContentTerm]) -> Result<Option<String>> {
    if terms.is_empty() {
        return Ok(None);
    }

    let mut parts = Vec::with_capacity(terms.len() * 2);
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            parts.push(Fragment::Gap);
        }
        let mut fragment = if term.literal {
            Fragment::Literal(term.pattern.clone())
        } else {
            Fragment::Raw {
                pattern: term.pattern.clone(),
                grouped: needs_group(&term.pattern)?,
            }
        };
        if term.fold_case {
            fragment = Fragment::FoldCase(Box::new(fragment));
        }
        parts.push(fragment);
    }

    let tree = simplify(Fragment::Concat(parts));
    Ok(Some(render(&tree, false)))
}

/// Whether a regex changes meaning when something is appended to it: a
/// top-level alternation, or inline flags that would leak into later terms.
fn needs_group(pattern: &str) -> Result<bool> {
    let ast = Parser::new()
        .parse(pattern)
        .map_err(|e| Error::invalid(format!("bad regex {:?}: {}", pattern, e)))?;

    Ok(match &ast {
        Ast::Alternation(_) | Ast::Flags(_) => true,
        Ast::Concat(concat) => concat.asts.iter().any(|a| matches!(a, Ast::Flags(_))),
        _ => false,
    })
}

fn simplify(fragment: Fragment) -> Fragment {
    match fragment {
        Fragment::Concat(parts) => {
            let mut flat: Vec<Fragment> = Vec::with_capacity(parts.len());
            for part in parts {
                match simplify(part) {
                    Fragment::Concat(inner) => flat.extend(inner),
                    other if other.is_empty() => {}
                    other => flat.push(other),
                }
            }

            let mut out: Vec<Fragment> = Vec::with_capacity(flat.len());
            for part in flat {
                let absorbed = match (out.last_mut(), &part) {
                    (None, Fragment::Gap) | (Some(Fragment::Gap), Fragment::Gap) => true,
                    (Some(Fragment::Literal(prev)), Fragment::Literal(next)) => {
                        prev.push_str(next);
                        true
                    }
                    _ => false,
                };
                if !absorbed {
                    out.push(part);
                }
            }
            if out.last() == Some(&Fragment::Gap) {
                out.pop();
            }

            if out.len() == 1 {
                out.pop().unwrap_or(Fragment::Concat(Vec::new()))
            } else {
                Fragment::Concat(out)
            }
        }
        Fragment::FoldCase(inner) => match simplify(*inner) {
            empty if empty.is_empty() => Fragment::Concat(Vec::new()),
            nested @ Fragment::FoldCase(_) => nested,
            other => Fragment::FoldCase(Box::new(other)),
        },
        other => other,
    }
}

fn render(fragment: &Fragment, in_concat: bool) -> String {
    match fragment {
        Fragment::Literal(text) => regex::escape(text),
        Fragment::Raw { pattern, grouped } => {
            let pattern = tidy(pattern);
            if *grouped && in_concat {
                format!("(?:{})", pattern)
            } else {
                pattern
            }
        }
        Fragment::Gap => LAZY_GAP.to_string(),
        Fragment::FoldCase(inner) => format!("(?i:{})", render(inner, false)),
        Fragment::Concat(parts) => {
            let nested = parts.len() > 1;
            parts.iter().map(|p| render(p, nested)).collect()
        }
    }
}

/// `(?-s:.)` is a plain `.` unless the pattern turns dot-all on somewhere
fn tidy(pattern: &str) -> String {
    if enables_dot_all(pattern) {
        pattern.to_string()
    } else {
        pattern.replace("(?-s:.)", ".")
    }
}

fn enables_dot_all(pattern: &str) -> bool {
    pattern.match_indices("(?").any(|(i, _)| {
        pattern[i + 2..]
            .chars()
            .take_while(|c| c.is_ascii_alphabetic() || *c == '-')
            .take_while(|c| *c != '-')
            .any(|c| c == 's')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> ContentTerm {
        ContentTerm {
            pattern: s.to_string(),
            literal: true,
            fold_case: false,
        }
    }

    fn re(s: &str) -> ContentTerm {
        ContentTerm {
            pattern: s.to_string(),
            literal: false,
            fold_case: false,
        }
    }

    fn folded(mut term: ContentTerm) -> ContentTerm {
        term.fold_case = true;
        term
    }

    #[test]
    fn test_no_terms() {
        assert_eq!(compose(&[]).unwrap(), None);
    }

    #[test]
    fn test_single_literal_is_bare() {
        assert_eq!(compose(&[lit("foo")]).unwrap().as_deref(), Some("foo"));
    }

    #[test]
    fn test_literals_are_escaped() {
        assert_eq!(compose(&[lit("a.b(c)")]).unwrap().as_deref(), Some(r"a\.b\(c\)"));
    }

    #[test]
    fn test_gap_between_terms_only() {
        let got = compose(&[lit("foo"), lit("bar"), re("ba[zr]")]).unwrap();
        assert_eq!(got.as_deref(), Some("foo.*?bar.*?ba[zr]"));
    }

    #[test]
    fn test_fold_groups() {
        let got = compose(&[folded(lit("foo")), lit("Bar")]).unwrap();
        assert_eq!(got.as_deref(), Some("(?i:foo).*?Bar"));
    }

    #[test]
    fn test_alternation_grouped_when_joined() {
        assert_eq!(compose(&[re("a|b")]).unwrap().as_deref(), Some("a|b"));
        let got = compose(&[re("a|b"), lit("c")]).unwrap();
        assert_eq!(got.as_deref(), Some("(?:a|b).*?c"));
    }

    #[test]
    fn test_inline_flags_do_not_leak() {
        let got = compose(&[re("(?i)foo"), lit("Bar")]).unwrap();
        assert_eq!(got.as_deref(), Some("(?:(?i)foo).*?Bar"));
    }

    #[test]
    fn test_verbatim_regex() {
        assert_eq!(compose(&[re("foo.*bar")]).unwrap().as_deref(), Some("foo.*bar"));
    }

    #[test]
    fn test_tidy_any_char_not_nl() {
        assert_eq!(compose(&[re("a(?-s:.)b")]).unwrap().as_deref(), Some("a.b"));
        assert_eq!(
            compose(&[re("(?s)a(?-s:.)b")]).unwrap().as_deref(),
            Some("(?s)a(?-s:.)b")
        );
    }

    #[test]
    fn test_empty_terms_dropped() {
        let got = compose(&[lit(""), lit("foo"), re("")]).unwrap();
        assert_eq!(got.as_deref(), Some("foo"));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(compose(&[re("(")]).is_err());
    }

    #[test]
    fn test_composed_pattern_semantics() {
        let pattern = compose(&[folded(lit("foo")), lit("Bar")]).unwrap().unwrap();
        let regex = regex::Regex::new(&pattern).unwrap();
        assert!(regex.is_match("let FOO = Bar;"));
        assert!(!regex.is_match("let foo = bar;"));
        assert!(!regex.is_match("Bar before foo"));
        assert!(!regex.is_match("foo\nBar"));
    }
}
