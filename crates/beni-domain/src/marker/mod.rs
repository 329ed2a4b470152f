//! Extra handling on top of `pep508_rs` marker trees.
//!
//! flit gates optional dependencies with an `extra == "name"` conjunct. The
//! helpers here evaluate a tree against one candidate extra and remove that
//! conjunct again, matching on the crate's `Expression | And | Or` shape.

mod environment;

pub use environment::{host_marker_environment, InterpreterEnv, FALLBACK_PYTHON_VERSION};
pub use pep508_rs::{MarkerEnvironment, MarkerExpression, MarkerTree};

use crate::normalize::normalize_name;

/// Whether `tree` holds in `env` when `extra` is the requested extra.
///
/// `extra` comparisons are decided here on normalized names; every other
/// expression is evaluated by `pep508_rs`.
#[must_use]
pub fn evaluate_with_extra(tree: &MarkerTree, env: &MarkerEnvironment, extra: &str) -> bool {
    match tree {
        MarkerTree::And(children) => children
            .iter()
            .all(|child| evaluate_with_extra(child, env, extra)),
        MarkerTree::Or(children) => children
            .iter()
            .any(|child| evaluate_with_extra(child, env, extra)),
        MarkerTree::Expression(expression) => match extra_comparison(expression) {
            Some(comparison) => {
                (normalize_name(&comparison.name) == normalize_name(extra)) == comparison.equal
            }
            None => tree.evaluate(env, &[]),
        },
    }
}

/// True when the whole tree is a single `extra == "..."` comparison.
#[must_use]
pub fn is_extra_clause(tree: &MarkerTree) -> bool {
    match tree {
        MarkerTree::Expression(expression) => {
            extra_comparison(expression).is_some_and(|comparison| comparison.equal)
        }
        MarkerTree::And(_) | MarkerTree::Or(_) => false,
    }
}

/// Removes the `extra == "..."` clause flit adds to optional dependencies.
///
/// A tree that is only the clause yields `None`. A clause that is the first
/// or last conjunct of an `and` is dropped. Any other shape is returned as is.
#[must_use]
pub fn strip_extra_clause(tree: &MarkerTree) -> Option<MarkerTree> {
    match tree {
        MarkerTree::Expression(_) if is_extra_clause(tree) => None,
        MarkerTree::And(children) if children.len() >= 2 => {
            let mut rest = children.clone();
            if is_extra_clause(&rest[0]) {
                rest.remove(0);
            } else if rest.last().is_some_and(is_extra_clause) {
                rest.pop();
            } else {
                return Some(tree.clone());
            }
            if rest.len() == 1 {
                rest.pop()
            } else {
                Some(MarkerTree::And(rest))
            }
        }
        _ => Some(tree.clone()),
    }
}

struct ExtraComparison {
    equal: bool,
    name: String,
}

// Reads `extra == 'x'`, `'x' == extra` and the `!=` forms off the rendered
// expression so the check does not depend on the crate's expression layout.
fn extra_comparison(expression: &MarkerExpression) -> Option<ExtraComparison> {
    let rendered = expression.to_string();
    let parts: Vec<&str> = rendered.split_whitespace().collect();
    let [lhs, operator, rhs] = parts.as_slice() else {
        return None;
    };
    let equal = match *operator {
        "==" => true,
        "!=" => false,
        _ => return None,
    };
    let literal = match (*lhs, *rhs) {
        ("extra", literal) | (literal, "extra") => literal,
        _ => return None,
    };
    Some(ExtraComparison {
        equal,
        name: literal.trim_matches(|ch| ch == '\'' || ch == '"').to_string(),
    })
}
