//! # oxide-json-sqlite
//!
//! Runs compiled JSON lookups against SQLite, which stores documents as
//! canonical JSON text and so uses the generic text dialect.
//!
//! ```rust,no_run
//! use oxide_json_core::FilterExpression;
//! use oxide_json_sqlite::JsonTable;
//! use serde_json::json;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # async fn run() -> oxide_json_sqlite::Result<()> {
//! let pool = SqlitePoolOptions::new().connect(":memory:").await?;
//! let books = JsonTable::new(pool, "books", "data");
//! books.ensure_table().await?;
//! books.insert(&json!({"title": "Harry Potter"})).await?;
//!
//! let filter = FilterExpression::parse("data__has_key", "title")?;
//! assert_eq!(books.count(&[filter]).await?, 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod table;

pub use error::{QueryError, Result};
pub use table::JsonTable;
