//! Whitelist expressions: which outputs must survive minification.
//!
//! Grammar: terms separated by `,` or `|`, each an identifier optionally
//! negated with `!`. The expression is a tagged tree evaluated against the
//! known-name universe (cell names and output names), never executed.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parsed whitelist expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistExpr {
    /// A single cell or output name.
    Literal(String),
    /// Union of sub-expressions (`a, b` or `a | b`).
    Union(Vec<WhitelistExpr>),
    /// All known names except the inner set (`!a`).
    Complement(Box<WhitelistExpr>),
}

impl WhitelistExpr {
    /// Parse an expression string.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(Error::InvalidWhitelist("empty expression".to_string()));
        }

        let mut terms = Vec::new();
        for raw in input.split([',', '|']) {
            let term = raw.trim();
            if term.is_empty() {
                return Err(Error::InvalidWhitelist(format!(
                    "empty term in expression {input:?}"
                )));
            }
            let (negated, name) = match term.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, term),
            };
            if !IDENT_RE.is_match(name) {
                return Err(Error::InvalidWhitelist(format!("not a valid name: {term:?}")));
            }
            let literal = WhitelistExpr::Literal(name.to_string());
            terms.push(if negated {
                WhitelistExpr::Complement(Box::new(literal))
            } else {
                literal
            });
        }

        Ok(if terms.len() == 1 {
            terms.pop().expect("one term")
        } else {
            WhitelistExpr::Union(terms)
        })
    }

    /// Evaluate against the universe of known names.
    ///
    /// Referencing a name outside the universe is an error, not an empty set.
    pub fn eval(&self, universe: &BTreeSet<String>) -> Result<BTreeSet<String>> {
        match self {
            WhitelistExpr::Literal(name) => {
                if !universe.contains(name) {
                    return Err(Error::InvalidWhitelist(format!(
                        "unknown name '{name}': not a cell or output in this notebook"
                    )));
                }
                Ok(BTreeSet::from([name.clone()]))
            }
            WhitelistExpr::Union(terms) => {
                let mut names = BTreeSet::new();
                for term in terms {
                    names.extend(term.eval(universe)?);
                }
                Ok(names)
            }
            WhitelistExpr::Complement(inner) => {
                let excluded = inner.eval(universe)?;
                Ok(universe.difference(&excluded).cloned().collect())
            }
        }
    }
}

/// Parse and evaluate a whitelist expression into the keep seed.
///
/// An expression that resolves to the empty set against a non-empty notebook
/// is ambiguous user intent and rejected.
pub fn resolve_whitelist(input: &str, universe: &BTreeSet<String>) -> Result<BTreeSet<String>> {
    let expr = WhitelistExpr::parse(input)?;
    let names = expr.eval(universe)?;
    if names.is_empty() && !universe.is_empty() {
        return Err(Error::InvalidWhitelist(format!(
            "expression {input:?} selects no cells or outputs"
        )));
    }
    Ok(names)
}
