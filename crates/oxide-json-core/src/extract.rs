//! Extraction expressions and ordering on JSON paths.
//!
//! [`JsonExtract`] reads a path as a typed value wherever the host query
//! accepts an expression: a projection, a filter operand, or a sort key.
//! The rendered fragment is the same at every call site, so an annotation
//! and a filter against it line up exactly.
//!
//! ```rust
//! use oxide_json_core::{Backend, JsonExtract, LookupCompiler, Operator, OutputType};
//!
//! let compiler = LookupCompiler::new(Backend::Postgres);
//! let year = JsonExtract::new("data", ["publication", "year"]).output(OutputType::Numeric);
//!
//! let projection = compiler.compile_extract(&year).unwrap();
//! assert_eq!(
//!     projection.sql(),
//!     "CASE WHEN jsonb_typeof(\"data\" -> $1 -> $2) = 'number' \
//!      THEN (\"data\" -> $3 -> $4)::numeric END"
//! );
//!
//! let filter = compiler.compile(&year.filter(Operator::Exact, 1997)).unwrap();
//! assert_eq!(filter.sql(), format!("{} = $5", projection.sql()));
//! ```

use crate::builder::{SqlFragment, SqlValue};
use crate::coerce::OutputType;
use crate::dialect::JsonDialect;
use crate::error::Result;
use crate::lookup::{FilterExpression, Operator};
use crate::path::{self, JsonPath, PathSegment};

/// A typed read of a path inside a JSON column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonExtract {
    path: JsonPath,
    output: OutputType,
}

impl JsonExtract {
    /// Creates an extraction of `segments` from `column`, read as raw JSON.
    #[must_use]
    pub fn new<I, S>(column: &str, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self::from_path(JsonPath::with_segments(column, segments))
    }

    /// Creates an extraction from an existing path.
    #[must_use]
    pub fn from_path(path: JsonPath) -> Self {
        Self {
            path,
            output: OutputType::Json,
        }
    }

    /// Sets the type the value is read as.
    #[must_use]
    pub fn output(mut self, output: OutputType) -> Self {
        self.output = output;
        self
    }

    /// Returns the path.
    #[must_use]
    pub const fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Returns the output type.
    #[must_use]
    pub const fn output_type(&self) -> OutputType {
        self.output
    }

    /// Builds a filter on the extracted value.
    ///
    /// The operand decides the comparison type, so a numeric operand reads the
    /// path exactly as `self.output(OutputType::Numeric)` would.
    #[must_use]
    pub fn filter(
        &self,
        operator: Operator,
        operand: impl Into<serde_json::Value>,
    ) -> FilterExpression {
        FilterExpression::new(self.path.clone(), operator, operand)
    }

    /// Orders ascending by the extracted value.
    #[must_use]
    pub fn asc(self) -> OrderBy {
        OrderBy::new(self, OrderDirection::Asc)
    }

    /// Orders descending by the extracted value.
    #[must_use]
    pub fn desc(self) -> OrderBy {
        OrderBy::new(self, OrderDirection::Desc)
    }

    pub(crate) fn fragment(&self, dialect: &dyn JsonDialect) -> Result<SqlFragment> {
        path::resolve(&self.path, self.output, dialect)
    }

    /// Compiles the extraction for `dialect` with numbering from 1.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnsupportedPath`](crate::JsonLookupError::UnsupportedPath)
    /// when the dialect cannot address the path.
    pub fn compile(&self, dialect: &dyn JsonDialect) -> Result<ExtractionExpression> {
        let (sql, params) = self.fragment(dialect)?.render(dialect, 0).into_parts();
        Ok(ExtractionExpression {
            sql,
            params,
            output: self.output,
        })
    }
}

/// A compiled extraction: SQL, parameters and the type it evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionExpression {
    pub(crate) sql: String,
    pub(crate) params: Vec<SqlValue>,
    pub(crate) output: OutputType,
}

impl ExtractionExpression {
    /// Returns the SQL string.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Returns the inferred output type.
    #[must_use]
    pub const fn output_type(&self) -> OutputType {
        self.output
    }
}

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering on an extracted JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Sort key.
    pub target: JsonExtract,
    /// Order direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates an ordering specification.
    #[must_use]
    pub fn new(target: JsonExtract, direction: OrderDirection) -> Self {
        Self { target, direction }
    }

    /// Parses a Django-style order specification.
    ///
    /// Prefix with `-` for descending order, e.g. `"-data__title"`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::InvalidLookup`](crate::JsonLookupError::InvalidLookup)
    /// for malformed paths.
    pub fn parse(term: &str) -> Result<Self> {
        let (path, direction) = match term.strip_prefix('-') {
            Some(path) => (path, OrderDirection::Desc),
            None => (term, OrderDirection::Asc),
        };
        Ok(Self::new(
            JsonExtract::from_path(JsonPath::parse(path)?),
            direction,
        ))
    }

    pub(crate) fn fragment(&self, dialect: &dyn JsonDialect) -> Result<SqlFragment> {
        let keyword = match self.direction {
            OrderDirection::Asc => " ASC",
            OrderDirection::Desc => " DESC",
        };
        Ok(self.target.fragment(dialect)?.push_raw(keyword))
    }
}
