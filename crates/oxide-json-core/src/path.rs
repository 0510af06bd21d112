//! Field paths into JSON columns.
//!
//! A path is a column name followed by zero or more key or index steps,
//! written Django-style as `data__publication__year`.

use std::fmt;

use crate::builder::SqlFragment;
use crate::coerce::OutputType;
use crate::dialect::JsonDialect;
use crate::error::{JsonLookupError, Result};

/// Separator between lookup path parts.
pub const LOOKUP_SEP: &str = "__";

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member access.
    Key(String),
    /// Array element access.
    Index(usize),
}

impl PathSegment {
    /// Parses one lookup part. All-digit parts address array elements.
    #[must_use]
    pub fn parse(part: &str) -> Self {
        if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = part.parse() {
                return Self::Index(i);
            }
        }
        Self::Key(part.to_string())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A JSON column plus the segments addressing a value inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath {
    column: String,
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Creates a path addressing the whole column.
    #[must_use]
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            segments: Vec::new(),
        }
    }

    /// Creates a path from a column and segments.
    #[must_use]
    pub fn with_segments<I, S>(column: &str, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            column: column.to_string(),
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `column__key__key`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::InvalidLookup`] when the column or any
    /// segment is empty.
    pub fn parse(lookup: &str) -> Result<Self> {
        Self::from_parts(&lookup.split(LOOKUP_SEP).collect::<Vec<_>>(), lookup)
    }

    pub(crate) fn from_parts(parts: &[&str], lookup: &str) -> Result<Self> {
        let Some((column, rest)) = parts.split_first() else {
            return Err(JsonLookupError::InvalidLookup(lookup.to_string()));
        };
        if column.is_empty() || rest.iter().any(|p| p.is_empty()) {
            return Err(JsonLookupError::InvalidLookup(format!(
                "empty path segment in `{lookup}`"
            )));
        }
        Ok(Self {
            column: (*column).to_string(),
            segments: rest.iter().map(|p| PathSegment::parse(p)).collect(),
        })
    }

    /// Appends a key step.
    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.segments.push(PathSegment::Key(key.to_string()));
        self
    }

    /// Appends an index step.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the segments below the column.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns whether the path addresses the whole column.
    #[must_use]
    pub fn is_column(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column)?;
        for segment in &self.segments {
            write!(f, "{LOOKUP_SEP}{segment}")?;
        }
        Ok(())
    }
}

/// Resolves a path into the dialect's extraction expression, read as `output`.
///
/// # Errors
///
/// Returns [`JsonLookupError::UnsupportedPath`] when the path has segments and
/// the dialect cannot address them.
pub fn resolve(
    path: &JsonPath,
    output: OutputType,
    dialect: &dyn JsonDialect,
) -> Result<SqlFragment> {
    if !path.is_column() && !dialect.supports_paths() {
        return Err(JsonLookupError::UnsupportedPath {
            backend: dialect.backend(),
        });
    }
    let column = SqlFragment::raw(dialect.quote_identifier(path.column()));
    Ok(dialect.extract(column, path.segments(), output))
}

/// Renders one segment as a SQL/JSON path argument (`$."key"`, `$[n]`).
pub(crate) fn member_path(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => format!("$.{}", serde_json::Value::String(key.clone())),
        PathSegment::Index(i) => format!("$[{i}]"),
    }
}
