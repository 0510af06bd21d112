//! Lookup compilation.

use serde_json::Value;
use tracing::{debug, trace, warn};

use super::{like_pattern, FilterExpression, Operator};
use crate::builder::{CompiledExpression, SqlFragment};
use crate::coerce::{self, OperandKind, OutputType};
use crate::config::{CompilerConfig, MissingKeyPolicy};
use crate::dialect::{Backend, JsonDialect, LookupKind};
use crate::error::{JsonLookupError, Result};
use crate::extract::{ExtractionExpression, JsonExtract, OrderBy};
use crate::path::{self, JsonPath};

/// Compiles JSON lookups for one backend.
///
/// The compiler holds no mutable state; one instance can serve any number of
/// queries, from any number of threads.
///
/// # Example
///
/// ```rust
/// use oxide_json_core::{FilterExpression, LookupCompiler};
/// use serde_json::json;
///
/// let compiler = LookupCompiler::for_engine("django.db.backends.mysql").unwrap();
/// let filter = FilterExpression::parse("data__has_any_keys", json!(["title", "foo"])).unwrap();
/// let compiled = compiler.compile(&filter).unwrap();
///
/// assert_eq!(
///     compiled.sql(),
///     "COALESCE(JSON_CONTAINS_PATH(`data`, 'one', ?) \
///      OR JSON_CONTAINS_PATH(`data`, 'one', ?), FALSE)"
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LookupCompiler {
    dialect: &'static dyn JsonDialect,
    missing_keys: MissingKeyPolicy,
    param_offset: usize,
}

impl LookupCompiler {
    /// Creates a compiler for a backend with default settings.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            dialect: backend.dialect(),
            missing_keys: MissingKeyPolicy::default(),
            param_offset: 0,
        }
    }

    /// Creates a compiler for a connection's backend identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnknownBackend`] for unrecognised identifiers.
    pub fn for_engine(identifier: &str) -> Result<Self> {
        Backend::from_engine(identifier).map(Self::new)
    }

    /// Creates a compiler from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnknownBackend`] for unrecognised identifiers.
    pub fn from_config(config: &CompilerConfig) -> Result<Self> {
        Ok(Self::new(config.backend()?)
            .missing_keys(config.missing_keys)
            .param_offset(config.param_offset))
    }

    /// Sets the policy for lookups on absent keys.
    #[must_use]
    pub const fn missing_keys(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_keys = policy;
        self
    }

    /// Sets how many parameters the enclosing query has already bound.
    #[must_use]
    pub const fn param_offset(mut self, offset: usize) -> Self {
        self.param_offset = offset;
        self
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn JsonDialect {
        self.dialect
    }

    /// Returns the active backend.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.dialect.backend()
    }

    /// Compiles a filter into a predicate.
    ///
    /// # Errors
    ///
    /// * [`JsonLookupError::UnsupportedOperator`] when the backend has no form
    ///   for the lookup.
    /// * [`JsonLookupError::UnsupportedPath`] when the backend cannot address
    ///   the path.
    /// * [`JsonLookupError::MalformedOperand`] when the operand does not fit
    ///   the operator.
    pub fn compile(&self, filter: &FilterExpression) -> Result<CompiledExpression> {
        let compiled = self
            .predicate(filter)?
            .render(self.dialect, self.param_offset);
        debug!(
            backend = %self.backend(),
            operator = %filter.operator(),
            path = %filter.path(),
            sql = %compiled.sql(),
            "Compiled JSON lookup"
        );
        Ok(compiled)
    }

    /// Compiles an extraction for use as a projection or filter operand.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnsupportedPath`] when the backend cannot
    /// address the path.
    pub fn compile_extract(&self, extract: &JsonExtract) -> Result<ExtractionExpression> {
        let (sql, params) = extract
            .fragment(self.dialect)?
            .render(self.dialect, self.param_offset)
            .into_parts();
        Ok(ExtractionExpression {
            sql,
            params,
            output: extract.output_type(),
        })
    }

    /// Compiles an ordering term.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnsupportedPath`] when the backend cannot
    /// address the path.
    pub fn compile_order(&self, order: &OrderBy) -> Result<CompiledExpression> {
        Ok(order
            .fragment(self.dialect)?
            .render(self.dialect, self.param_offset))
    }

    fn predicate(&self, filter: &FilterExpression) -> Result<SqlFragment> {
        let operator = filter.operator();
        let operand = filter.operand();
        let kind = operator.kind(operand);
        let support = self.dialect.support(kind);
        trace!(backend = %self.backend(), %operator, ?kind, %support, "Capability lookup");

        if !support.is_supported() {
            warn!(backend = %self.backend(), %operator, "Lookup not supported on backend");
            return Err(self.unsupported(operator));
        }

        let path = filter.path();
        let predicate = match kind {
            LookupKind::Equality => self.equality(path, operand)?,
            LookupKind::CaseInsensitiveEquality => {
                let text = expect_string(operator, operand)?;
                let lhs = self.dialect.lower(self.resolve(path, OutputType::Text)?);
                lhs.binary("=", self.dialect.lower(SqlFragment::param(text)))
            }
            LookupKind::Containment | LookupKind::ContainedBy => {
                let lhs = self.resolve(path, OutputType::Json)?;
                let rhs = coerce::as_document(operand).into_fragment(self.dialect);
                self.dialect
                    .containment(lhs, rhs, kind == LookupKind::ContainedBy)
                    .ok_or_else(|| self.unsupported(operator))?
            }
            LookupKind::KeyExists => {
                let key = expect_string(operator, operand)?;
                self.key_exists(path, key)?
            }
            LookupKind::AllKeysExist | LookupKind::AnyKeyExists => {
                let keys = expect_keys(operator, operand)?;
                let parts = keys
                    .into_iter()
                    .map(|key| self.key_exists(path, key))
                    .collect::<Result<Vec<_>>>()?;
                let separator = if kind == LookupKind::AllKeysExist {
                    " AND "
                } else {
                    " OR "
                };
                SqlFragment::join(parts, separator)
            }
            LookupKind::PatternMatch | LookupKind::CaseInsensitivePattern => {
                let text = expect_string(operator, operand)?;
                let pattern = SqlFragment::param(like_pattern(operator.pattern_shape(), text));
                let lhs = self.resolve(path, OutputType::Text)?;
                let (lhs, pattern) = if kind == LookupKind::CaseInsensitivePattern {
                    (self.dialect.lower(lhs), self.dialect.lower(pattern))
                } else {
                    (lhs, pattern)
                };
                lhs.binary("LIKE", pattern).push_raw(self.dialect.like_escape())
            }
            LookupKind::Comparison => self.comparison(path, operator, operand)?,
            LookupKind::Membership => self.membership(path, operand)?,
        };

        Ok(self.guard_missing(kind, predicate))
    }

    fn resolve(&self, path: &JsonPath, output: OutputType) -> Result<SqlFragment> {
        path::resolve(path, output, self.dialect)
    }

    fn unsupported(&self, operator: Operator) -> JsonLookupError {
        JsonLookupError::UnsupportedOperator {
            operator,
            backend: self.backend(),
        }
    }

    /// Whole documents compare structurally; subfields compare as the
    /// operand's type, so a string operand never matches a number.
    fn equality(&self, path: &JsonPath, operand: &Value) -> Result<SqlFragment> {
        let coerced = if path.is_column() {
            coerce::as_document(operand)
        } else {
            coerce::coerce(operand)
        };
        let lhs = self.resolve(path, coerced.output)?;
        Ok(lhs.binary("=", coerced.into_fragment(self.dialect)))
    }

    fn key_exists(&self, path: &JsonPath, key: &str) -> Result<SqlFragment> {
        let target = self.resolve(path, OutputType::Json)?;
        Ok(self.dialect.key_exists(target, key))
    }

    fn comparison(
        &self,
        path: &JsonPath,
        operator: Operator,
        operand: &Value,
    ) -> Result<SqlFragment> {
        let coerced = coerce::coerce(operand);
        if !matches!(coerced.output, OutputType::Numeric | OutputType::Text) {
            return Err(JsonLookupError::malformed(
                operator,
                format!(
                    "expected a number or a string, got a {}",
                    OperandKind::of(operand).name()
                ),
            ));
        }
        let token = operator.comparison_token().unwrap_or("=");
        let lhs = self.resolve(path, coerced.output)?;
        Ok(lhs.binary(token, coerced.into_fragment(self.dialect)))
    }

    fn membership(&self, path: &JsonPath, operand: &Value) -> Result<SqlFragment> {
        let Value::Array(items) = operand else {
            return Err(JsonLookupError::malformed(
                Operator::In,
                format!("expected a sequence, got a {}", OperandKind::of(operand).name()),
            ));
        };
        if items.is_empty() {
            return Ok(SqlFragment::raw("1 = 0"));
        }

        let mut output = None;
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let kind = OperandKind::of(item);
            if kind.is_structural() {
                return Err(JsonLookupError::malformed(
                    Operator::In,
                    format!("sequence items must be scalars, got a {}", kind.name()),
                ));
            }
            let coerced = coerce::coerce(item);
            match output {
                None => output = Some(coerced.output),
                Some(existing) if existing != coerced.output => {
                    return Err(JsonLookupError::malformed(
                        Operator::In,
                        "sequence items must share one type",
                    ));
                }
                Some(_) => {}
            }
            values.push(coerced.into_fragment(self.dialect));
        }

        let lhs = self.resolve(path, output.unwrap_or_default())?;
        Ok(lhs.binary("IN", SqlFragment::join(values, ", ").paren()))
    }

    fn guard_missing(&self, kind: LookupKind, predicate: SqlFragment) -> SqlFragment {
        let key_lookup = matches!(
            kind,
            LookupKind::KeyExists | LookupKind::AllKeysExist | LookupKind::AnyKeyExists
        );
        if key_lookup || self.missing_keys == MissingKeyPolicy::False {
            predicate.wrap("COALESCE(", ", FALSE)")
        } else {
            predicate
        }
    }
}

fn expect_string(operator: Operator, operand: &Value) -> Result<&str> {
    operand.as_str().ok_or_else(|| {
        JsonLookupError::malformed(
            operator,
            format!("expected a string, got a {}", OperandKind::of(operand).name()),
        )
    })
}

fn expect_keys(operator: Operator, operand: &Value) -> Result<Vec<&str>> {
    let Value::Array(items) = operand else {
        return Err(JsonLookupError::malformed(
            operator,
            format!(
                "expected a sequence of keys, got a {}",
                OperandKind::of(operand).name()
            ),
        ));
    };
    if items.is_empty() {
        return Err(JsonLookupError::malformed(operator, "expected at least one key"));
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| JsonLookupError::malformed(operator, "keys must be strings"))
        })
        .collect()
}
