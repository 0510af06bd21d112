//! # oxide-json-core
//!
//! Django-style JSON field lookups compiled to SQL for backends with and
//! without native JSON support.
//!
//! This crate provides:
//! - Lookup parsing (`data__publication__year__gt`) into filter expressions
//! - A per-backend capability table with native and fallback SQL forms
//! - Operand-driven casts so numbers never compare as text
//! - Reusable extraction expressions for projections and ordering
//!
//! ## Compiling a Lookup
//!
//! ```rust
//! use oxide_json_core::{Backend, FilterExpression, LookupCompiler};
//! use serde_json::json;
//!
//! let filter = FilterExpression::parse("data__contains", json!({"author": "Tolkien"})).unwrap();
//! let compiled = LookupCompiler::new(Backend::Postgres).compile(&filter).unwrap();
//!
//! assert_eq!(compiled.sql(), "\"data\" @> $1::jsonb");
//! ```
//!
//! ## Unsupported Lookups
//!
//! A lookup the backend cannot express fails at compile time instead of
//! being silently downgraded:
//!
//! ```rust
//! use oxide_json_core::{Backend, FilterExpression, JsonLookupError, LookupCompiler};
//! use serde_json::json;
//!
//! let filter = FilterExpression::parse("data__contains", json!({"author": "Tolkien"})).unwrap();
//! let err = LookupCompiler::new(Backend::MySql).compile(&filter).unwrap_err();
//!
//! assert!(matches!(err, JsonLookupError::UnsupportedOperator { .. }));
//! ```

pub mod builder;
pub mod coerce;
pub mod config;
pub mod dialect;
pub mod error;
pub mod eval;
pub mod extract;
pub mod lookup;
pub mod path;

pub use builder::{CompiledExpression, SqlFragment, SqlValue, ToSqlValue};
pub use coerce::OutputType;
pub use config::{CompilerConfig, MissingKeyPolicy};
pub use dialect::{Backend, JsonDialect};
pub use error::{JsonLookupError, Result};
pub use extract::{ExtractionExpression, JsonExtract, OrderBy, OrderDirection};
pub use lookup::{FilterExpression, LookupCompiler, Operator};
pub use path::{JsonPath, PathSegment};
