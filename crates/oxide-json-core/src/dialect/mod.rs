//! SQL dialect support for JSON lookups.
//!
//! Backends differ both in which JSON lookups they can express and in how
//! they spell them. What is legal lives in a static capability table (see
//! [`capability`]); how it is spelled lives in the [`JsonDialect`] trait.
//! Adding a backend means adding one row set to the table and one trait
//! implementation, without touching the lookup compiler.

mod capability;
mod generic;
mod mysql;
mod postgres;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use capability::{capability, LookupKind, Support};
pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use crate::builder::SqlFragment;
use crate::coerce::OutputType;
use crate::error::{JsonLookupError, Result};
use crate::path::PathSegment;

/// The database backends this crate can compile for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// PostgreSQL `jsonb`: native JSON operators.
    Postgres,
    /// MySQL/MariaDB: JSON functions stand in for the missing operators.
    MySql,
    /// Anything else: JSON stored as canonical text, no path access.
    Generic,
}

impl Backend {
    /// Resolves a connection's reported backend identifier.
    ///
    /// Accepts bare names (`postgresql`, `mysql`, `sqlite3`) as well as
    /// Django engine paths (`django.db.backends.postgresql`).
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnknownBackend`] for unrecognised identifiers.
    pub fn from_engine(identifier: &str) -> Result<Self> {
        let lowered = identifier.trim().to_ascii_lowercase();
        let name = lowered.rsplit('.').next().unwrap_or_default();
        match name {
            "postgres" | "postgresql" | "postgresql_psycopg2" | "postgis" | "pg" => {
                Ok(Self::Postgres)
            }
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" | "spatialite" | "generic" => Ok(Self::Generic),
            _ => Err(JsonLookupError::UnknownBackend(identifier.to_string())),
        }
    }

    /// Returns the backend's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Generic => "generic",
        }
    }

    /// Returns the dialect implementation for this backend.
    #[must_use]
    pub fn dialect(self) -> &'static dyn JsonDialect {
        match self {
            Self::Postgres => &PostgresDialect,
            Self::MySql => &MySqlDialect,
            Self::Generic => &GenericDialect,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = JsonLookupError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_engine(s)
    }
}

/// Trait for dialect-specific JSON SQL.
///
/// Implementations are stateless and shared between threads.
pub trait JsonDialect: fmt::Debug + Send + Sync {
    /// Returns the backend this dialect renders for.
    fn backend(&self) -> Backend;

    /// Returns the name of the dialect.
    fn name(&self) -> &'static str {
        self.backend().name()
    }

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Returns the placeholder for the 1-based parameter `index`.
    fn placeholder(&self, _index: usize) -> String {
        String::from("?")
    }

    /// Looks up how (and whether) this dialect supports a lookup kind.
    fn support(&self, kind: LookupKind) -> Support {
        capability(self.backend(), kind)
    }

    /// Returns whether paths inside a document can be addressed.
    fn supports_paths(&self) -> bool {
        true
    }

    /// Returns the clause appended to `LIKE` so backslash escapes apply.
    fn like_escape(&self) -> &'static str {
        ""
    }

    /// Marks a bound canonical-JSON literal as a JSON value.
    fn json_literal(&self, literal: SqlFragment) -> SqlFragment {
        literal
    }

    /// Reads `segments` out of `column` as `output`.
    ///
    /// Typed outputs are NULL when the value has another JSON type.
    fn extract(
        &self,
        column: SqlFragment,
        segments: &[PathSegment],
        output: OutputType,
    ) -> SqlFragment;

    /// Tests whether `target` has the top-level `key`.
    fn key_exists(&self, target: SqlFragment, key: &str) -> SqlFragment;

    /// `left` contains `right` (or, when `reversed`, is contained by it).
    ///
    /// Returns `None` when the dialect has no containment form.
    fn containment(
        &self,
        _left: SqlFragment,
        _right: SqlFragment,
        _reversed: bool,
    ) -> Option<SqlFragment> {
        None
    }

    /// Folds an expression to lower case.
    fn lower(&self, expr: SqlFragment) -> SqlFragment {
        expr.wrap("LOWER(", ")")
    }
}
