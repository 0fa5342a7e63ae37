//! Reconcile per-atom case sensitivity into ripgrep flags.

/// Summary of the case sensitivity of every content atom in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseDirective {
    /// All atoms are case sensitive: no flag
    SensitiveOnly,
    /// All atoms are case insensitive: a single `-i`
    InsensitiveOnly,
    /// Atoms disagree: insensitive atoms get an inline `(?i:...)` group
    Mixed,
}

impl CaseDirective {
    /// Derive the directive from resolved sensitivities, in atom order.
    ///
    /// Returns `None` when there are no content atoms at all.
    pub fn from_sensitivities(sensitive: &[bool]) -> Option<Self> {
        let first = *sensitive.first()?;
        if sensitive.iter().all(|&s| s == first) {
            Some(if first {
                CaseDirective::SensitiveOnly
            } else {
                CaseDirective::InsensitiveOnly
            })
        } else {
            Some(CaseDirective::Mixed)
        }
    }

    /// The global ripgrep flag for this directive, if any
    pub fn global_flag(self) -> Option<&'static str> {
        match self {
            CaseDirective::InsensitiveOnly => Some("-i"),
            CaseDirective::SensitiveOnly | CaseDirective::Mixed => None,
        }
    }

    /// Whether an atom with the given sensitivity needs its own fold group
    pub fn wraps(self, sensitive: bool) -> bool {
        self == CaseDirective::Mixed && !sensitive
    }
}
