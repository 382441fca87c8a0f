//! In-memory evaluation of expressions against records.

use serde_json::Value;

use super::{Criterion, Expr};

/// A value that exposes named fields to expressions.
pub trait Record {
    /// Returns the value of `name`, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

impl Record for serde_json::Map<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Expr {
    /// Evaluate this expression against a record.
    ///
    /// Comparisons against missing fields (or missing keys) never match.
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Expr::Field { field, criterion } => record
                .field(field)
                .is_some_and(|value| criterion.matches(&value)),
            Expr::Key {
                field,
                key,
                criterion,
            } => match record.field(field) {
                Some(Value::Object(map)) => map
                    .get(key)
                    .is_some_and(|value| criterion.matches(value)),
                _ => false,
            },
            Expr::And(items) => items.iter().all(|item| item.evaluate(record)),
            Expr::Or(items) => items.iter().any(|item| item.evaluate(record)),
        }
    }
}

impl Criterion {
    /// Whether `actual` satisfies this criterion.
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Criterion::Same(expected) => actual == expected,
            Criterion::Equals(expected) => loose_equals(actual, expected),
            Criterion::NotSame(expected) => actual != expected,
            Criterion::NotEquals(expected) => !loose_equals(actual, expected),
            Criterion::StartsWith(prefix) => actual
                .as_str()
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Criterion::EndsWith(suffix) => actual
                .as_str()
                .is_some_and(|s| s.ends_with(suffix.as_str())),
        }
    }
}

/// Loose equality between two JSON values.
///
/// Numbers compare by numeric value, numeric strings compare equal to the
/// numbers they spell, and booleans and nulls compare by truthiness.
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .is_some_and(|parsed| Some(parsed) == n.as_f64()),
        (Value::Bool(flag), other) | (other, Value::Bool(flag)) => *flag == truthy(other),
        (Value::Null, other) | (other, Value::Null) => !truthy(other),
        _ => a == b,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
