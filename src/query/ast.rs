use std::fmt;

/// How an atom's case sensitivity was specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    /// Smart case: sensitive only if the pattern has an uppercase letter
    #[default]
    Auto,
    /// case:yes
    Sensitive,
    /// case:no
    Insensitive,
}

impl CaseMode {
    /// Resolve the mode against a literal pattern
    pub fn is_sensitive(self, pattern: &str) -> bool {
        match self {
            CaseMode::Sensitive => true,
            CaseMode::Insensitive => false,
            CaseMode::Auto => pattern.chars().any(char::is_uppercase),
        }
    }

    /// Resolve the mode against a regular expression.
    ///
    /// Escapes are never counted, so `\S`, `\W`, `\pL` or `\p{Greek}`
    /// alone do not make a pattern case sensitive.
    pub fn is_sensitive_regex(self, pattern: &str) -> bool {
        match self {
            CaseMode::Sensitive => true,
            CaseMode::Insensitive => false,
            CaseMode::Auto => {
                let mut chars = pattern.chars();
                while let Some(ch) = chars.next() {
                    if ch == '\\' {
                        if let Some('p' | 'P') = chars.next() {
                            // class name: one letter or a braced name
                            if chars.next() == Some('{') {
                                chars.by_ref().find(|&c| c == '}');
                            }
                        }
                    } else if ch.is_uppercase() {
                        return true;
                    }
                }
                false
            }
        }
    }
}

/// Leaf predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Literal text on a line (or in a file name when `file_scoped`)
    Substring {
        pattern: String,
        case: CaseMode,
        file_scoped: bool,
    },
    /// Regular expression on a line (or in a file name when `file_scoped`)
    Regexp {
        pattern: String,
        case: CaseMode,
        file_scoped: bool,
    },
    /// File path glob (f:, file:)
    Glob { pattern: String, case: CaseMode },
    /// Substring of a repository's workspace-relative name (r:, repo:)
    RepoName { pattern: String },
    /// Constant truth value
    Const(bool),
}

impl Atom {
    /// Literal content atom with smart case
    pub fn substring(pattern: impl Into<String>) -> Self {
        Atom::Substring {
            pattern: pattern.into(),
            case: CaseMode::Auto,
            file_scoped: false,
        }
    }

    /// Regex content atom with smart case
    pub fn regexp(pattern: impl Into<String>) -> Self {
        Atom::Regexp {
            pattern: pattern.into(),
            case: CaseMode::Auto,
            file_scoped: false,
        }
    }

    /// File glob atom with smart case
    pub fn glob(pattern: impl Into<String>) -> Self {
        Atom::Glob {
            pattern: pattern.into(),
            case: CaseMode::Auto,
        }
    }

    pub fn repo(pattern: impl Into<String>) -> Self {
        Atom::RepoName {
            pattern: pattern.into(),
        }
    }

    /// Copy of this atom with its case mode replaced (no-op for atoms without one)
    pub fn with_case(&self, mode: CaseMode) -> Self {
        let mut atom = self.clone();
        match &mut atom {
            Atom::Substring { case, .. } | Atom::Regexp { case, .. } | Atom::Glob { case, .. } => {
                *case = mode;
            }
            Atom::RepoName { .. } | Atom::Const(_) => {}
        }
        atom
    }
}

/// Boolean expression over atoms.
///
/// The order of `And` children is significant: content atoms must appear on
/// a line in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Atom(Atom),
}

impl Predicate {
    pub fn atom(atom: Atom) -> Self {
        Predicate::Atom(atom)
    }

    pub fn constant(value: bool) -> Self {
        Predicate::Atom(Atom::Const(value))
    }

    pub fn negate(child: Predicate) -> Self {
        Predicate::Not(Box::new(child))
    }

    /// The value of this predicate if it is a constant
    pub fn as_const(&self) -> Option<bool> {
        match self {
            Predicate::Atom(Atom::Const(v)) => Some(*v),
            _ => None,
        }
    }

    /// Visit every atom, depth first, left to right
    pub fn visit_atoms<'a>(&'a self, f: &mut impl FnMut(&'a Atom)) {
        match self {
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.visit_atoms(f);
                }
            }
            Predicate::Not(child) => child.visit_atoms(f),
            Predicate::Atom(atom) => f(atom),
        }
    }

    /// Build a new tree with every atom replaced by `f(atom)`.
    ///
    /// The receiver is left untouched so one query can be rewritten for
    /// many repositories.
    pub fn map_atoms(&self, f: &mut impl FnMut(&Atom) -> Predicate) -> Predicate {
        match self {
            Predicate::And(children) => {
                Predicate::And(children.iter().map(|c| c.map_atoms(f)).collect())
            }
            Predicate::Or(children) => {
                Predicate::Or(children.iter().map(|c| c.map_atoms(f)).collect())
            }
            Predicate::Not(child) => Predicate::negate(child.map_atoms(f)),
            Predicate::Atom(atom) => f(atom),
        }
    }

    /// Whether any atom filters on repository name
    pub fn has_repo_atoms(&self) -> bool {
        let mut found = false;
        self.visit_atoms(&mut |atom| {
            if matches!(atom, Atom::RepoName { .. }) {
                found = true;
            }
        });
        found
    }
}

impl From<Atom> for Predicate {
    fn from(atom: Atom) -> Self {
        Predicate::Atom(atom)
    }
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseMode::Auto => write!(f, "auto"),
            CaseMode::Sensitive => write!(f, "yes"),
            CaseMode::Insensitive => write!(f, "no"),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Substring {
                pattern,
                case,
                file_scoped,
            } => {
                let prefix = if *file_scoped { "file_substr" } else { "substr" };
                write!(f, "{}:{:?}", prefix, pattern)?;
                if *case != CaseMode::Auto {
                    write!(f, " case:{}", case)?;
                }
                Ok(())
            }
            Atom::Regexp {
                pattern,
                case,
                file_scoped,
            } => {
                let prefix = if *file_scoped { "file_regex" } else { "regex" };
                write!(f, "{}:{:?}", prefix, pattern)?;
                if *case != CaseMode::Auto {
                    write!(f, " case:{}", case)?;
                }
                Ok(())
            }
            Atom::Glob { pattern, case } => {
                write!(f, "file:{:?}", pattern)?;
                if *case != CaseMode::Auto {
                    write!(f, " case:{}", case)?;
                }
                Ok(())
            }
            Atom::RepoName { pattern } => write!(f, "repo:{:?}", pattern),
            Atom::Const(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(children) | Predicate::Or(children) => {
                let sep = if matches!(self, Predicate::And(_)) { " " } else { " or " };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Predicate::Not(child) => write!(f, "-{}", child),
            Predicate::Atom(atom) => write!(f, "{}", atom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_case_literal() {
        assert!(!CaseMode::Auto.is_sensitive("foo"));
        assert!(CaseMode::Auto.is_sensitive("Foo"));
        assert!(CaseMode::Sensitive.is_sensitive("foo"));
        assert!(!CaseMode::Insensitive.is_sensitive("FOO"));
    }

    #[test]
    fn test_smart_case_regex_ignores_escapes() {
        assert!(!CaseMode::Auto.is_sensitive_regex(r"foo\S+"));
        assert!(!CaseMode::Auto.is_sensitive_regex(r"\W\D"));
        assert!(CaseMode::Auto.is_sensitive_regex(r"\sFoo"));
    }

    #[test]
    fn test_smart_case_regex_ignores_unicode_classes() {
        assert!(!CaseMode::Auto.is_sensitive_regex(r"\p{Greek}x"));
        assert!(!CaseMode::Auto.is_sensitive_regex(r"\P{Lu}+"));
        assert!(!CaseMode::Auto.is_sensitive_regex(r"\pLx"));
        assert!(CaseMode::Auto.is_sensitive_regex(r"\p{Greek}X"));
        assert!(CaseMode::Auto.is_sensitive_regex(r"\pL\pNFoo"));
    }

    #[test]
    fn test_map_atoms_leaves_original_intact() {
        let q = Predicate::And(vec![
            Atom::repo("tools").into(),
            Predicate::negate(Atom::glob("*.md").into()),
            Atom::substring("main").into(),
        ]);
        let mapped = q.map_atoms(&mut |atom| match atom {
            Atom::RepoName { .. } => Predicate::constant(true),
            other => Predicate::atom(other.clone()),
        });

        assert!(q.has_repo_atoms());
        assert!(!mapped.has_repo_atoms());
        match mapped {
            Predicate::And(children) => {
                assert_eq!(children[0], Predicate::constant(true));
                assert!(matches!(children[1], Predicate::Not(_)));
            }
            other => panic!("Expected And, got {}", other),
        }
    }

    #[test]
    fn test_with_case() {
        let atom = Atom::glob("*.rs").with_case(CaseMode::Sensitive);
        assert_eq!(
            atom,
            Atom::Glob {
                pattern: "*.rs".to_string(),
                case: CaseMode::Sensitive
            }
        );
        assert_eq!(Atom::repo("x").with_case(CaseMode::Sensitive), Atom::repo("x"));
    }

    #[test]
    fn test_display() {
        let q = Predicate::And(vec![
            Atom::substring("foo").into(),
            Predicate::negate(Atom::glob("*.md").into()),
        ]);
        assert_eq!(q.to_string(), "(substr:\"foo\" -file:\"*.md\")");
    }
}
