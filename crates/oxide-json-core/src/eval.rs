//! In-memory evaluation of lookups.
//!
//! Filters and extractions evaluated over [`serde_json::Value`] documents with
//! the semantics the compiled SQL has on the native backend. Useful as an
//! oracle when checking fallback forms, and for filtering documents that never
//! reach a database.

use std::cmp::Ordering;

use serde_json::Value;

use crate::coerce::canonical_json;
use crate::extract::{JsonExtract, OrderBy, OrderDirection};
use crate::lookup::{FilterExpression, Operator};
use crate::path::PathSegment;

/// Follows `segments` into `document`.
#[must_use]
pub fn navigate<'a>(document: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    segments.iter().try_fold(document, |value, segment| match (segment, value) {
        (PathSegment::Key(key), Value::Object(map)) => map.get(key),
        (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
        _ => None,
    })
}

/// Structural equality: key order is irrelevant, numbers compare by value.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Returns whether `container` contains `candidate`.
///
/// Objects contain objects whose every entry they contain; arrays contain
/// arrays whose every element matches some element of theirs; an array also
/// contains a bare scalar it holds. Scalars contain only equal scalars.
#[must_use]
pub fn contains(container: &Value, candidate: &Value) -> bool {
    match (container, candidate) {
        (Value::Object(outer), Value::Object(inner)) => inner
            .iter()
            .all(|(key, value)| outer.get(key).is_some_and(|v| contains(v, value))),
        (Value::Array(outer), Value::Array(inner)) => inner
            .iter()
            .all(|value| outer.iter().any(|v| contains(v, value))),
        (Value::Array(outer), scalar) if !scalar.is_object() => {
            outer.iter().any(|v| json_eq(v, scalar))
        }
        _ => json_eq(container, candidate),
    }
}

const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values.
///
/// Values of different types order null, string, number, boolean, array,
/// object. Within a type: numbers by value, strings bytewise, arrays
/// element-wise, objects by their canonical text.
#[must_use]
pub fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| compare_json(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        (Value::Object(_), Value::Object(_)) => canonical_json(a).cmp(&canonical_json(b)),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Equality after the operand decides the comparison type.
///
/// Text reads only see strings, so `"1954"` does not equal `1954`.
#[allow(clippy::float_cmp)]
fn coerced_eq(target: &Value, operand: &Value) -> bool {
    match operand {
        Value::Number(n) => target
            .as_f64()
            .zip(n.as_f64())
            .is_some_and(|(t, n)| t == n),
        Value::String(s) => target.as_str() == Some(s.as_str()),
        _ => json_eq(target, operand),
    }
}

fn coerced_cmp(target: &Value, operand: &Value) -> Option<Ordering> {
    match operand {
        Value::Number(n) => target.as_f64()?.partial_cmp(&n.as_f64()?),
        Value::String(s) => Some(target.as_str()?.cmp(s.as_str())),
        _ => None,
    }
}

fn has_key(target: &Value, key: &Value) -> bool {
    match (target, key) {
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

fn text_matches(target: &Value, operand: &Value, operator: Operator) -> bool {
    let (Some(text), Some(needle)) = (target.as_str(), operand.as_str()) else {
        return false;
    };
    let (text, needle) = match operator {
        Operator::IContains | Operator::IStartsWith | Operator::IEndsWith => {
            (text.to_lowercase(), needle.to_lowercase())
        }
        _ => (text.to_string(), needle.to_string()),
    };
    match operator {
        Operator::StartsWith | Operator::IStartsWith => text.starts_with(&needle),
        Operator::EndsWith | Operator::IEndsWith => text.ends_with(&needle),
        _ => text.contains(&needle),
    }
}

impl FilterExpression {
    /// Evaluates the filter against one column value.
    ///
    /// A path that does not exist in `document` never matches.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        let Some(target) = navigate(document, self.path().segments()) else {
            return false;
        };
        let operand = self.operand();

        match self.operator() {
            Operator::Exact if self.path().is_column() => json_eq(target, operand),
            Operator::Exact => coerced_eq(target, operand),
            Operator::IExact => match (target.as_str(), operand.as_str()) {
                (Some(text), Some(s)) => text.to_lowercase() == s.to_lowercase(),
                _ => false,
            },
            Operator::Contains if !operand.is_string() => contains(target, operand),
            Operator::ContainedBy => contains(operand, target),
            Operator::HasKey => has_key(target, operand),
            Operator::HasKeys => operand
                .as_array()
                .is_some_and(|keys| !keys.is_empty() && keys.iter().all(|k| has_key(target, k))),
            Operator::HasAnyKeys => operand
                .as_array()
                .is_some_and(|keys| keys.iter().any(|k| has_key(target, k))),
            op @ (Operator::Contains
            | Operator::IContains
            | Operator::StartsWith
            | Operator::IStartsWith
            | Operator::EndsWith
            | Operator::IEndsWith) => text_matches(target, operand, op),
            Operator::Gt => coerced_cmp(target, operand).is_some_and(Ordering::is_gt),
            Operator::Gte => coerced_cmp(target, operand).is_some_and(Ordering::is_ge),
            Operator::Lt => coerced_cmp(target, operand).is_some_and(Ordering::is_lt),
            Operator::Lte => coerced_cmp(target, operand).is_some_and(Ordering::is_le),
            Operator::In => operand
                .as_array()
                .is_some_and(|items| items.iter().any(|item| coerced_eq(target, item))),
        }
    }
}

impl JsonExtract {
    /// Reads the extraction's path from a column value.
    #[must_use]
    pub fn evaluate<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        navigate(document, self.path().segments())
    }
}

impl OrderBy {
    /// Compares two column values by this ordering.
    ///
    /// Documents missing the path sort last in ascending order and first in
    /// descending order, as NULLs do on Postgres.
    #[must_use]
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ascending = match (self.target.evaluate(a), self.target.evaluate(b)) {
            (Some(x), Some(y)) => compare_json(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match self.direction {
            OrderDirection::Asc => ascending,
            OrderDirection::Desc => ascending.reverse(),
        }
    }
}
