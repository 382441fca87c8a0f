//! Immutable predicate trees over named record fields.
//!
//! Expressions are plain values: composing two expressions returns a new
//! tree and two expressions are equal iff their trees are structurally equal.
//!
//! ```
//! use webasset_core::expr::Expr;
//!
//! let expr = Expr::same("state", "enabled")
//!     .and_starts_with("query", "/app")
//!     .or_x(Expr::same("uuid", "abcd"));
//!
//! assert!(matches!(expr, Expr::Or(ref items) if items.len() == 2));
//! ```

mod eval;

use std::fmt;

use serde_json::Value;

pub use eval::{Record, loose_equals};

/// A comparison applied to a single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Strict equality: same type and same value.
    Same(Value),
    /// Loose equality: numeric strings equal numbers, booleans compare by truthiness.
    Equals(Value),
    NotSame(Value),
    NotEquals(Value),
    StartsWith(String),
    EndsWith(String),
}

impl Criterion {
    fn operator(&self) -> &'static str {
        match self {
            Criterion::Same(_) => "===",
            Criterion::Equals(_) => "==",
            Criterion::NotSame(_) => "!==",
            Criterion::NotEquals(_) => "!=",
            Criterion::StartsWith(_) => "starts with",
            Criterion::EndsWith(_) => "ends with",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Same(v)
            | Criterion::Equals(v)
            | Criterion::NotSame(v)
            | Criterion::NotEquals(v) => write!(f, "{} {}", self.operator(), v),
            Criterion::StartsWith(s) | Criterion::EndsWith(s) => {
                write!(f, "{} {:?}", self.operator(), s)
            }
        }
    }
}

/// A predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Compares the value of `field`.
    Field { field: String, criterion: Criterion },
    /// Compares the entry `key` of the map stored in `field`.
    Key {
        field: String,
        key: String,
        criterion: Criterion,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn field(field: impl Into<String>, criterion: Criterion) -> Self {
        Expr::Field {
            field: field.into(),
            criterion,
        }
    }

    pub fn key(field: impl Into<String>, key: impl Into<String>, criterion: Criterion) -> Self {
        Expr::Key {
            field: field.into(),
            key: key.into(),
            criterion,
        }
    }

    pub fn same(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Criterion::Same(value.into()))
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Criterion::Equals(value.into()))
    }

    pub fn not_same(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Criterion::NotSame(value.into()))
    }

    pub fn not_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Criterion::NotEquals(value.into()))
    }

    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::field(field, Criterion::StartsWith(prefix.into()))
    }

    pub fn ends_with(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::field(field, Criterion::EndsWith(suffix.into()))
    }

    pub fn key_same(
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::key(field, key, Criterion::Same(value.into()))
    }

    /// Conjoins `other` onto this expression.
    ///
    /// A conjunction grows by one conjunct (a nested conjunction stays
    /// nested); any other expression becomes the first conjunct of a new
    /// conjunction. Conjoining an expression that is already present returns
    /// the expression unchanged.
    pub fn and_x(self, other: Expr) -> Expr {
        match self {
            Expr::And(mut conjuncts) => {
                if !conjuncts.contains(&other) {
                    conjuncts.push(other);
                }
                Expr::And(conjuncts)
            }
            expr if expr == other => expr,
            expr => Expr::And(vec![expr, other]),
        }
    }

    /// Disjoins `other` onto this expression. Mirrors [`Expr::and_x`].
    pub fn or_x(self, other: Expr) -> Expr {
        match self {
            Expr::Or(mut disjuncts) => {
                if !disjuncts.contains(&other) {
                    disjuncts.push(other);
                }
                Expr::Or(disjuncts)
            }
            expr if expr == other => expr,
            expr => Expr::Or(vec![expr, other]),
        }
    }

    pub fn and_same(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.and_x(Expr::same(field, value))
    }

    pub fn and_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.and_x(Expr::equals(field, value))
    }

    pub fn and_not_same(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.and_x(Expr::not_same(field, value))
    }

    pub fn and_not_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.and_x(Expr::not_equals(field, value))
    }

    pub fn and_starts_with(self, field: impl Into<String>, prefix: impl Into<String>) -> Expr {
        self.and_x(Expr::starts_with(field, prefix))
    }

    pub fn and_ends_with(self, field: impl Into<String>, suffix: impl Into<String>) -> Expr {
        self.and_x(Expr::ends_with(field, suffix))
    }

    pub fn and_key_same(
        self,
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Expr {
        self.and_x(Expr::key_same(field, key, value))
    }

    pub fn or_same(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.or_x(Expr::same(field, value))
    }

    pub fn or_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.or_x(Expr::equals(field, value))
    }

    pub fn or_not_same(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.or_x(Expr::not_same(field, value))
    }

    pub fn or_not_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Expr {
        self.or_x(Expr::not_equals(field, value))
    }

    pub fn or_starts_with(self, field: impl Into<String>, prefix: impl Into<String>) -> Expr {
        self.or_x(Expr::starts_with(field, prefix))
    }

    pub fn or_ends_with(self, field: impl Into<String>, suffix: impl Into<String>) -> Expr {
        self.or_x(Expr::ends_with(field, suffix))
    }

    pub fn or_key_same(
        self,
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Expr {
        self.or_x(Expr::key_same(field, key, value))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field { field, criterion } => write!(f, "{field} {criterion}"),
            Expr::Key {
                field,
                key,
                criterion,
            } => write!(f, "{field}[{key:?}] {criterion}"),
            Expr::And(items) => write_junction(f, items, " && "),
            Expr::Or(items) => write_junction(f, items, " || "),
        }
    }
}

fn write_junction(f: &mut fmt::Formatter<'_>, items: &[Expr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match item {
            Expr::And(_) | Expr::Or(_) => write!(f, "({item})")?,
            _ => write!(f, "{item}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_x_on_leaf_creates_conjunction() {
        let expr = Expr::same("a", 1).and_same("b", 2);
        assert_eq!(
            expr,
            Expr::And(vec![Expr::same("a", 1), Expr::same("b", 2)])
        );
    }

    #[test]
    fn and_x_on_conjunction_appends() {
        let expr = Expr::same("a", 1).and_same("b", 2).and_ends_with("c", "x");
        let Expr::And(items) = expr else {
            panic!("expected conjunction");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[2], Expr::ends_with("c", "x"));
    }

    #[test]
    fn and_x_keeps_nested_conjunction_nested() {
        let nested = Expr::same("b", 2).and_same("c", 3);
        let expr = Expr::same("a", 1).and_same("z", 0).and_x(nested.clone());
        assert_eq!(
            expr,
            Expr::And(vec![Expr::same("a", 1), Expr::same("z", 0), nested])
        );
    }

    #[test]
    fn and_x_ignores_duplicates() {
        let expr = Expr::same("a", 1).and_same("a", 1);
        assert_eq!(expr, Expr::same("a", 1));

        let expr = Expr::same("a", 1).and_same("b", 2).and_same("b", 2);
        assert_eq!(
            expr,
            Expr::And(vec![Expr::same("a", 1), Expr::same("b", 2)])
        );
    }

    #[test]
    fn or_x_on_conjunction_wraps_it() {
        let conj = Expr::same("a", 1).and_same("b", 2);
        let expr = conj.clone().or_same("c", 3);
        assert_eq!(expr, Expr::Or(vec![conj, Expr::same("c", 3)]));
    }

    #[test]
    fn structurally_equal_trees_are_equal() {
        let a = Expr::starts_with("uuid", "ab").or_key_same("params", "target", "local");
        let b = Expr::starts_with("uuid", "ab").or_key_same("params", "target", "local");
        assert_eq!(a, b);
        assert_ne!(a, Expr::starts_with("uuid", "ab"));
    }

    #[test]
    fn same_and_equals_are_distinct() {
        assert_ne!(Expr::same("a", "1"), Expr::equals("a", "1"));
    }

    #[test]
    fn display_parenthesizes_nested_junctions() {
        let expr = Expr::same("state", "enabled")
            .and_x(Expr::starts_with("uuid", "ab").or_key_same("params", "target", "x"));
        assert_eq!(
            expr.to_string(),
            r#"state === "enabled" && (uuid starts with "ab" || params["target"] === "x")"#
        );
    }
}
