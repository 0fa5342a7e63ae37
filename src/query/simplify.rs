//! Constant folding over predicate trees.
//!
//! Applied once after parsing and again after repository atoms have been
//! replaced by constants, so a query that only filtered on repositories
//! collapses to `true` or `false`.

use super::ast::Predicate;

/// Return a simplified copy of `predicate`
pub fn simplify(predicate: &Predicate) -> Predicate {
    match predicate {
        Predicate::Atom(atom) => Predicate::Atom(atom.clone()),
        Predicate::Not(child) => match simplify(child) {
            Predicate::Not(inner) => *inner,
            other => match other.as_const() {
                Some(v) => Predicate::constant(!v),
                None => Predicate::negate(other),
            },
        },
        Predicate::And(children) => fold(children, true),
        Predicate::Or(children) => fold(children, false),
    }
}

/// Fold an `And` (identity `true`) or an `Or` (identity `false`).
fn fold(children: &[Predicate], is_and: bool) -> Predicate {
    let identity = is_and;
    let mut out = Vec::with_capacity(children.len());

    for child in children {
        let child = simplify(child);
        match child.as_const() {
            Some(v) if v == identity => continue,
            Some(_) => return Predicate::constant(!identity),
            None => {}
        }
        match child {
            Predicate::And(grand) if is_and => out.extend(grand),
            Predicate::Or(grand) if !is_and => out.extend(grand),
            other => out.push(other),
        }
    }

    match out.len() {
        0 => Predicate::constant(identity),
        1 => out.pop().unwrap_or(Predicate::constant(identity)),
        _ if is_and => Predicate::And(out),
        _ => Predicate::Or(out),
    }
}
