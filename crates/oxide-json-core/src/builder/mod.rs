//! Parameterized SQL building blocks.
//!
//! # Example
//!
//! ```rust
//! use oxide_json_core::builder::SqlFragment;
//! use oxide_json_core::dialect::PostgresDialect;
//!
//! let (sql, params) = SqlFragment::raw("\"data\" -> ")
//!     .push_param("author")
//!     .render(&PostgresDialect, 0)
//!     .into_parts();
//!
//! assert_eq!(sql, "\"data\" -> $1");
//! assert_eq!(params.len(), 1);
//! ```

mod fragment;
pub mod value;

pub use fragment::{CompiledExpression, SqlFragment};
pub use value::{SqlValue, ToSqlValue};
