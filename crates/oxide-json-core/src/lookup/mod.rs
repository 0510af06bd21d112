//! JSON field lookups.
//!
//! A lookup is written the Django way, `column__key__key__operator`, and
//! compiled by [`LookupCompiler`] into a predicate for the active backend.
//!
//! ```rust
//! use oxide_json_core::{Backend, FilterExpression, LookupCompiler};
//!
//! let filter = FilterExpression::parse("data__publication__year__gt", 1900).unwrap();
//! let compiled = LookupCompiler::new(Backend::Postgres).compile(&filter).unwrap();
//! assert_eq!(
//!     compiled.sql(),
//!     "CASE WHEN jsonb_typeof(\"data\" -> $1 -> $2) = 'number' \
//!      THEN (\"data\" -> $3 -> $4)::numeric END > $5"
//! );
//! ```

mod compiler;
mod pattern;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

pub use compiler::LookupCompiler;
pub use pattern::escape_like;
pub(crate) use pattern::{like_pattern, PatternShape};

use crate::coerce::OperandKind;
use crate::dialect::LookupKind;
use crate::error::{JsonLookupError, Result};
use crate::path::{JsonPath, LOOKUP_SEP};

/// Lookup operators applicable to a JSON column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `exact`
    Exact,
    /// `iexact`
    IExact,
    /// `contains`: structural superset for documents, substring for strings.
    Contains,
    /// `icontains`
    IContains,
    /// `contained_by`
    ContainedBy,
    /// `has_key`
    HasKey,
    /// `has_keys`
    HasKeys,
    /// `has_any_keys`
    HasAnyKeys,
    /// `startswith`
    StartsWith,
    /// `istartswith`
    IStartsWith,
    /// `endswith`
    EndsWith,
    /// `iendswith`
    IEndsWith,
    /// `gt`
    Gt,
    /// `gte`
    Gte,
    /// `lt`
    Lt,
    /// `lte`
    Lte,
    /// `in`
    In,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Self; 17] = [
        Self::Exact,
        Self::IExact,
        Self::Contains,
        Self::IContains,
        Self::ContainedBy,
        Self::HasKey,
        Self::HasKeys,
        Self::HasAnyKeys,
        Self::StartsWith,
        Self::IStartsWith,
        Self::EndsWith,
        Self::IEndsWith,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
    ];

    /// Returns the lookup name, as written after the last `__`.
    #[must_use]
    pub const fn lookup_name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::ContainedBy => "contained_by",
            Self::HasKey => "has_key",
            Self::HasKeys => "has_keys",
            Self::HasAnyKeys => "has_any_keys",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::EndsWith => "endswith",
            Self::IEndsWith => "iendswith",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }

    /// Finds the operator with the given lookup name.
    #[must_use]
    pub fn from_lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.lookup_name() == name)
    }

    /// Classifies the lookup for the capability table.
    #[must_use]
    pub fn kind(self, operand: &Value) -> LookupKind {
        match self {
            Self::Exact => LookupKind::Equality,
            Self::IExact => LookupKind::CaseInsensitiveEquality,
            Self::Contains if OperandKind::of(operand) == OperandKind::String => {
                LookupKind::PatternMatch
            }
            Self::Contains => LookupKind::Containment,
            Self::ContainedBy => LookupKind::ContainedBy,
            Self::HasKey => LookupKind::KeyExists,
            Self::HasKeys => LookupKind::AllKeysExist,
            Self::HasAnyKeys => LookupKind::AnyKeyExists,
            Self::StartsWith | Self::EndsWith => LookupKind::PatternMatch,
            Self::IContains | Self::IStartsWith | Self::IEndsWith => {
                LookupKind::CaseInsensitivePattern
            }
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => LookupKind::Comparison,
            Self::In => LookupKind::Membership,
        }
    }

    pub(crate) const fn pattern_shape(self) -> PatternShape {
        match self {
            Self::StartsWith | Self::IStartsWith => PatternShape::StartsWith,
            Self::EndsWith | Self::IEndsWith => PatternShape::EndsWith,
            _ => PatternShape::Contains,
        }
    }

    /// Returns the SQL comparison token for ordering operators.
    pub(crate) const fn comparison_token(self) -> Option<&'static str> {
        match self {
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lookup_name())
    }
}

impl FromStr for Operator {
    type Err = JsonLookupError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_lookup(s)
            .ok_or_else(|| JsonLookupError::InvalidLookup(format!("unknown operator `{s}`")))
    }
}

/// A single lookup against a JSON column: path, operator and operand.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    path: JsonPath,
    operator: Operator,
    operand: Value,
}

impl FilterExpression {
    /// Creates a filter expression.
    #[must_use]
    pub fn new(path: JsonPath, operator: Operator, operand: impl Into<Value>) -> Self {
        Self {
            path,
            operator,
            operand: operand.into(),
        }
    }

    /// Parses a Django-style lookup such as `data__publication__year__gte`.
    ///
    /// A trailing operator name is optional; without one the lookup is
    /// `exact`. A lone column name never reads as an operator.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::InvalidLookup`] for empty segments.
    pub fn parse(lookup: &str, operand: impl Into<Value>) -> Result<Self> {
        let parts: Vec<&str> = lookup.split(LOOKUP_SEP).collect();
        let (operator, path_parts) = match parts.split_last() {
            Some((last, rest)) if !rest.is_empty() => match Operator::from_lookup(last) {
                Some(op) => (op, rest),
                None => (Operator::Exact, parts.as_slice()),
            },
            _ => (Operator::Exact, parts.as_slice()),
        };
        let path = JsonPath::from_parts(path_parts, lookup)?;
        Ok(Self::new(path, operator, operand))
    }

    /// Returns the path.
    #[must_use]
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Returns the operator.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the operand.
    #[must_use]
    pub fn operand(&self) -> &Value {
        &self.operand
    }
}
