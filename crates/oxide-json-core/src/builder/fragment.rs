//! Parameterized SQL fragments.
//!
//! A fragment is a sequence of raw SQL pieces and bound parameters. It only
//! turns into placeholder text when rendered for a dialect, so fragments can
//! be nested freely and Postgres-style numbered placeholders stay in order.

use super::value::{SqlValue, ToSqlValue};
use crate::dialect::JsonDialect;

#[derive(Debug, Clone, PartialEq)]
enum Chunk {
    Raw(String),
    Param(SqlValue),
}

/// A SQL fragment under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    chunks: Vec<Chunk>,
}

impl SqlFragment {
    /// Creates a fragment from raw SQL.
    ///
    /// **Warning**: Only use this for SQL that doesn't contain user input.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            chunks: vec![Chunk::Raw(sql.into())],
        }
    }

    /// Creates a fragment holding a single bound parameter.
    #[must_use]
    pub fn param<T: ToSqlValue>(value: T) -> Self {
        Self {
            chunks: vec![Chunk::Param(value.to_sql_value())],
        }
    }

    /// Appends raw SQL.
    #[must_use]
    pub fn push_raw(mut self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        if let Some(Chunk::Raw(last)) = self.chunks.last_mut() {
            last.push_str(&sql);
        } else {
            self.chunks.push(Chunk::Raw(sql));
        }
        self
    }

    /// Appends a bound parameter.
    #[must_use]
    pub fn push_param<T: ToSqlValue>(mut self, value: T) -> Self {
        self.chunks.push(Chunk::Param(value.to_sql_value()));
        self
    }

    /// Appends another fragment.
    #[must_use]
    pub fn append(mut self, other: Self) -> Self {
        for chunk in other.chunks {
            match chunk {
                Chunk::Raw(sql) => self = self.push_raw(sql),
                param @ Chunk::Param(_) => self.chunks.push(param),
            }
        }
        self
    }

    /// Surrounds the fragment with `prefix` and `suffix`.
    #[must_use]
    pub fn wrap(self, prefix: &str, suffix: &str) -> Self {
        Self::raw(prefix).append(self).push_raw(suffix)
    }

    /// Wraps the fragment in parentheses.
    #[must_use]
    pub fn paren(self) -> Self {
        self.wrap("(", ")")
    }

    /// Creates a binary expression `left op right`.
    #[must_use]
    pub fn binary(self, op: &str, right: Self) -> Self {
        self.push_raw(format!(" {op} ")).append(right)
    }

    /// Joins fragments with a separator.
    #[must_use]
    pub fn join(parts: Vec<Self>, separator: &str) -> Self {
        let mut joined = Self::default();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                joined = joined.push_raw(separator);
            }
            joined = joined.append(part);
        }
        joined
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| matches!(c, Chunk::Param(_)))
            .count()
    }

    /// Renders the fragment with the dialect's placeholders.
    ///
    /// `offset` is the number of parameters already bound by the enclosing
    /// query; numbered placeholders continue from there.
    #[must_use]
    pub fn render(self, dialect: &dyn JsonDialect, offset: usize) -> CompiledExpression {
        let mut sql = String::new();
        let mut params = Vec::new();
        for chunk in self.chunks {
            match chunk {
                Chunk::Raw(s) => sql.push_str(&s),
                Chunk::Param(value) => {
                    params.push(value);
                    sql.push_str(&dialect.placeholder(offset + params.len()));
                }
            }
        }
        CompiledExpression { sql, params }
    }
}

/// A compiled SQL fragment and its parameters, ready for the host query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    sql: String,
    params: Vec<SqlValue>,
}

impl CompiledExpression {
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

    /// Consumes the expression and returns the SQL and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}
