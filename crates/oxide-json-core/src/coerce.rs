//! Operand type coercion.
//!
//! The extraction cast is chosen from the operand's JSON category so the
//! engine compares like with like: numbers numerically, strings as text,
//! documents structurally. A typed read is NULL when the stored value has
//! another JSON type, so `"1954"` never matches the number `1954`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::{SqlFragment, SqlValue};
use crate::dialect::JsonDialect;

/// The SQL type an extracted JSON value is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// The raw JSON value.
    #[default]
    Json,
    /// The value as unquoted text.
    Text,
    /// The value cast to a number.
    Numeric,
    /// The value cast to a boolean.
    Boolean,
}

/// The JSON category of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An object.
    Mapping,
    /// An array.
    Sequence,
}

impl OperandKind {
    /// Classifies a JSON value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Object(_) => Self::Mapping,
            Value::Array(_) => Self::Sequence,
        }
    }

    /// Returns a human-readable name, used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        }
    }

    /// Returns whether the category is compared structurally.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(self, Self::Mapping | Self::Sequence)
    }
}

/// An operand after coercion: the cast for the extracted side and the
/// literal for the operand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    /// How the path must be extracted.
    pub output: OutputType,
    /// The bound operand.
    pub literal: SqlValue,
}

impl Coerced {
    /// Renders the operand side, casting JSON literals as the dialect needs.
    #[must_use]
    pub fn into_fragment(self, dialect: &dyn JsonDialect) -> SqlFragment {
        match self.output {
            OutputType::Json => dialect.json_literal(SqlFragment::param(self.literal)),
            _ => SqlFragment::param(self.literal),
        }
    }
}

/// Chooses the extraction cast and literal for an operand.
#[must_use]
pub fn coerce(operand: &Value) -> Coerced {
    match operand {
        Value::Number(n) => Coerced {
            output: OutputType::Numeric,
            literal: SqlValue::from_number(n),
        },
        Value::String(s) => Coerced {
            output: OutputType::Text,
            literal: SqlValue::Text(s.clone()),
        },
        Value::Null | Value::Bool(_) | Value::Object(_) | Value::Array(_) => as_document(operand),
    }
}

/// Coerces an operand for structural comparison regardless of its category.
#[must_use]
pub fn as_document(operand: &Value) -> Coerced {
    Coerced {
        output: OutputType::Json,
        literal: SqlValue::Text(canonical_json(operand)),
    }
}

/// Serializes a value compactly with object keys sorted at every level.
///
/// Two documents that are structurally equal always produce the same text,
/// which is what text-only backends compare.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_reads_as_numeric() {
        let c = coerce(&json!(1997));
        assert_eq!(c.output, OutputType::Numeric);
        assert_eq!(c.literal, SqlValue::Int(1997));
    }

    #[test]
    fn test_string_reads_as_text() {
        let c = coerce(&json!("Tolkien"));
        assert_eq!(c.output, OutputType::Text);
        assert_eq!(c.literal, SqlValue::Text("Tolkien".into()));
    }

    #[test]
    fn test_mapping_is_canonical_document() {
        let c = coerce(&json!({"b": 2, "a": {"d": 1, "c": [3, {"z": 0, "y": 1}]}}));
        assert_eq!(c.output, OutputType::Json);
        assert_eq!(
            c.literal,
            SqlValue::Text(r#"{"a":{"c":[3,{"y":1,"z":0}],"d":1},"b":2}"#.into())
        );
    }

    #[test]
    fn test_canonical_json_order_independent() {
        let a: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn test_canonical_json_escapes_keys() {
        assert_eq!(canonical_json(&json!({"say \"hi\"": null})), r#"{"say \"hi\"":null}"#);
    }

    #[test]
    fn test_bool_and_null_compare_as_documents() {
        assert_eq!(coerce(&json!(true)).output, OutputType::Json);
        assert_eq!(coerce(&Value::Null).literal, SqlValue::Text("null".into()));
    }

    #[test]
    fn test_operand_kind() {
        assert_eq!(OperandKind::of(&json!([1])), OperandKind::Sequence);
        assert!(OperandKind::of(&json!({})).is_structural());
        assert!(!OperandKind::of(&json!("x")).is_structural());
        assert_eq!(OperandKind::Number.name(), "number");
    }
}
