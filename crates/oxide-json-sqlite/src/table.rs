//! A table with one JSON document column.

use oxide_json_core::coerce::canonical_json;
use oxide_json_core::{Backend, FilterExpression, LookupCompiler, SqlValue};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqlitePool};
use sqlx::{Row, Sqlite};
use tracing::debug;

use crate::error::Result;

/// A SQLite table storing one JSON document per row.
///
/// Documents are written as canonical JSON text so whole-document equality
/// can compare text.
#[derive(Debug, Clone)]
pub struct JsonTable {
    pool: SqlitePool,
    table: String,
    column: String,
    compiler: LookupCompiler,
}

impl JsonTable {
    /// Creates a handle on `table`, whose documents live in `column`.
    #[must_use]
    pub fn new(pool: SqlitePool, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
            column: column.into(),
            compiler: LookupCompiler::new(Backend::Generic),
        }
    }

    /// Replaces the compiler, e.g. to change the missing-key policy.
    #[must_use]
    pub fn with_compiler(mut self, compiler: LookupCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    fn quoted_table(&self) -> String {
        self.compiler.dialect().quote_identifier(&self.table)
    }

    fn quoted_column(&self) -> String {
        self.compiler.dialect().quote_identifier(&self.column)
    }

    /// Creates the table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Database` if the statement fails.
    pub async fn ensure_table(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} \
             (id INTEGER PRIMARY KEY AUTOINCREMENT, {} TEXT NOT NULL)",
            self.quoted_table(),
            self.quoted_column()
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Stores a document and returns its row id.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Database` if the insert fails.
    pub async fn insert(&self, document: &Value) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?)",
            self.quoted_table(),
            self.quoted_column()
        );
        let result = sqlx::query(&sql)
            .bind(canonical_json(document))
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Builds the WHERE clause: every filter, and the negation of every
    /// exclude, joined with AND.
    fn build_where_clause(
        &self,
        filters: &[FilterExpression],
        excludes: &[FilterExpression],
    ) -> Result<(String, Vec<SqlValue>)> {
        let mut conditions = Vec::with_capacity(filters.len() + excludes.len());
        let mut params = Vec::new();
        for filter in filters {
            let (sql, filter_params) = self.compile_at(filter, params.len())?;
            conditions.push(sql);
            params.extend(filter_params);
        }
        for exclude in excludes {
            let (sql, exclude_params) = self.compile_at(exclude, params.len())?;
            conditions.push(format!("NOT ({sql})"));
            params.extend(exclude_params);
        }
        if conditions.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", conditions.join(" AND ")), params))
        }
    }

    fn compile_at(
        &self,
        filter: &FilterExpression,
        offset: usize,
    ) -> Result<(String, Vec<SqlValue>)> {
        Ok(self
            .compiler
            .param_offset(offset)
            .compile(filter)?
            .into_parts())
    }

    /// Builds the COUNT query for `filters`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Lookup` if a filter cannot be compiled.
    pub fn build_count(&self, filters: &[FilterExpression]) -> Result<(String, Vec<SqlValue>)> {
        self.build_count_excluding(filters, &[])
    }

    /// Builds the COUNT query for rows matching `filters` and none of
    /// `excludes`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Lookup` if a filter cannot be compiled.
    pub fn build_count_excluding(
        &self,
        filters: &[FilterExpression],
        excludes: &[FilterExpression],
    ) -> Result<(String, Vec<SqlValue>)> {
        let (where_clause, params) = self.build_where_clause(filters, excludes)?;
        Ok((
            format!("SELECT COUNT(*) FROM {}{where_clause}", self.quoted_table()),
            params,
        ))
    }

    /// Builds the document query for `filters`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Lookup` if a filter cannot be compiled.
    pub fn build_values(&self, filters: &[FilterExpression]) -> Result<(String, Vec<SqlValue>)> {
        let (where_clause, params) = self.build_where_clause(filters, &[])?;
        Ok((
            format!(
                "SELECT {} FROM {}{where_clause} ORDER BY id",
                self.quoted_column(),
                self.quoted_table()
            ),
            params,
        ))
    }

    /// Counts the documents matching every filter.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Lookup` if a filter cannot be compiled, or
    /// `QueryError::Database` if the query fails.
    pub async fn count(&self, filters: &[FilterExpression]) -> Result<i64> {
        self.count_excluding(filters, &[]).await
    }

    /// Counts the documents matching every filter and none of the excludes.
    ///
    /// An exclude that is NULL for a row (a missing document under
    /// `MissingKeyPolicy::Exclude`) drops that row too, since `NOT (NULL)` is
    /// not true.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Lookup` if a filter cannot be compiled, or
    /// `QueryError::Database` if the query fails.
    pub async fn count_excluding(
        &self,
        filters: &[FilterExpression],
        excludes: &[FilterExpression],
    ) -> Result<i64> {
        let (sql, params) = self.build_count_excluding(filters, excludes)?;
        debug!(sql = %sql, params = params.len(), "Counting JSON documents");
        let mut query = sqlx::query(&sql);

        for param in params {
            query = bind_param_raw(query, param);
        }

        let row = query.fetch_one(&self.pool).await?;
        let count: i64 = row.get(0);
        Ok(count)
    }

    /// Returns the documents matching every filter.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Lookup` if a filter cannot be compiled,
    /// `QueryError::Database` if the query fails, or
    /// `QueryError::Decode` if a stored document is not valid JSON.
    pub async fn values(&self, filters: &[FilterExpression]) -> Result<Vec<Value>> {
        let (sql, params) = self.build_values(filters)?;
        debug!(sql = %sql, params = params.len(), "Fetching JSON documents");
        let mut query = sqlx::query(&sql);

        for param in params {
            query = bind_param_raw(query, param);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<Value> {
                let text: String = row.get(0);
                Ok(serde_json::from_str(&text)?)
            })
            .collect()
    }
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param_raw<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use oxide_json_core::{JsonLookupError, MissingKeyPolicy};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    fn tolkien() -> Value {
        json!({
            "title": "The Lord of the Rings",
            "author": "Tolkien",
            "publication": {"year": 1954}
        })
    }

    fn rowling() -> Value {
        json!({
            "title": "Harry Potter",
            "author": "Rowling",
            "publication": {"year": 1997}
        })
    }

    async fn create_books() -> JsonTable {
        let books = JsonTable::new(create_test_pool().await, "books", "data");
        books.ensure_table().await.unwrap();
        books.insert(&tolkien()).await.unwrap();
        books.insert(&rowling()).await.unwrap();
        books
    }

    fn filter(lookup: &str, operand: Value) -> FilterExpression {
        FilterExpression::parse(lookup, operand).unwrap()
    }

    #[tokio::test]
    async fn test_build_count() {
        let books = JsonTable::new(create_test_pool().await, "books", "data");
        let (sql, params) = books
            .build_count(&[filter("data__has_key", json!("title"))])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"books\" \
             WHERE COALESCE(json_type(\"data\", ?) IS NOT NULL, FALSE)"
        );
        assert_eq!(params, vec![SqlValue::Text("$.\"title\"".into())]);

        let (sql, params) = books.build_count(&[]).unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM \"books\"");
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_build_count_excluding() {
        let books = JsonTable::new(create_test_pool().await, "books", "data");
        let (sql, params) = books
            .build_count_excluding(
                &[filter("data__has_key", json!("title"))],
                &[filter("data", tolkien())],
            )
            .unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"books\" \
             WHERE COALESCE(json_type(\"data\", ?) IS NOT NULL, FALSE) AND NOT (\"data\" = ?)"
        );
        assert_eq!(params.len(), 2);
    }

    #[tokio::test]
    async fn test_has_key() {
        let books = create_books().await;
        assert_eq!(books.count(&[filter("data__has_key", json!("title"))]).await.unwrap(), 2);
        assert_eq!(books.count(&[filter("data__has_key", json!("foo"))]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_has_key_ignores_nested_and_case_variant_keys() {
        let books = create_books().await;
        books.insert(&json!({"meta": {"title": "nested"}})).await.unwrap();
        books.insert(&json!({"items": [{"title": "in an array"}]})).await.unwrap();
        books.insert(&json!({"TITLE": "shouting"})).await.unwrap();
        books.insert(&json!({"note": "\"title\": is only text here"})).await.unwrap();
        books.insert(&json!({"a_b": 1})).await.unwrap();

        assert_eq!(books.count(&[filter("data__has_key", json!("title"))]).await.unwrap(), 2);
        assert_eq!(books.count(&[filter("data__has_key", json!("TITLE"))]).await.unwrap(), 1);
        assert_eq!(books.count(&[filter("data__has_key", json!("year"))]).await.unwrap(), 0);
        assert_eq!(books.count(&[filter("data__has_key", json!("a%b"))]).await.unwrap(), 0);
        assert_eq!(books.count(&[filter("data__has_key", json!("a_b"))]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sql_counts_agree_with_evaluator() {
        let documents = vec![
            tolkien(),
            rowling(),
            json!({"meta": {"title": "nested"}}),
            json!({"TITLE": "shouting", "year": 2001}),
            json!({"note": "\"title\": is only text here"}),
        ];
        let books = JsonTable::new(create_test_pool().await, "books", "data");
        books.ensure_table().await.unwrap();
        for document in &documents {
            books.insert(document).await.unwrap();
        }

        let reordered = json!({
            "publication": {"year": 1997},
            "author": "Rowling",
            "title": "Harry Potter"
        });
        let mut scenarios = vec![
            filter("data__has_key", json!("title")),
            filter("data__has_key", json!("TITLE")),
            filter("data__has_key", json!("foo")),
            filter("data__has_key", json!("year")),
            filter("data__has_key", json!("publication")),
            filter("data", reordered),
            filter("data", json!({"author": "Brett"})),
            filter("data", json!({"title": "nested"})),
        ];
        scenarios.extend(documents.iter().map(|doc| filter("data", doc.clone())));

        for scenario in &scenarios {
            let expected = documents.iter().filter(|doc| scenario.matches(doc)).count();
            let actual = books.count(std::slice::from_ref(scenario)).await.unwrap();
            assert_eq!(
                usize::try_from(actual).unwrap(),
                expected,
                "{} {} {}",
                scenario.path(),
                scenario.operator(),
                scenario.operand()
            );
        }
    }

    #[tokio::test]
    async fn test_exact_whole_document() {
        let books = create_books().await;
        let reordered = json!({
            "publication": {"year": 1997},
            "author": "Rowling",
            "title": "Harry Potter"
        });
        assert_eq!(books.count(&[filter("data", reordered)]).await.unwrap(), 1);
        let brett = filter("data", json!({"author": "Brett"}));
        assert_eq!(books.count(&[brett]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multiple_filters_and() {
        let books = create_books().await;
        let filters = [
            filter("data__has_key", json!("title")),
            filter("data", rowling()),
        ];
        let docs = books.values(&filters).await.unwrap();
        assert_eq!(docs, vec![rowling()]);
    }

    #[tokio::test]
    async fn test_values_in_insertion_order() {
        let books = create_books().await;
        assert_eq!(books.values(&[]).await.unwrap(), vec![tolkien(), rowling()]);
    }

    #[tokio::test]
    async fn test_unsupported_lookups_fail_before_query() {
        let books = create_books().await;
        let err = books
            .count(&[filter("data__has_keys", json!(["title", "author"]))])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Lookup(JsonLookupError::UnsupportedOperator { .. })
        ));

        let err = books
            .count(&[filter("data__contains", json!({"author": "Tolkien"}))])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Lookup(JsonLookupError::UnsupportedOperator { .. })
        ));

        let err = books
            .count(&[filter("data__publication__year__gt", json!(1900))])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Lookup(JsonLookupError::UnsupportedPath { .. })
        ));
    }

    /// A shelf whose document column allows NULL, holding both fixtures and
    /// one row with no document at all.
    async fn create_shelf(policy: MissingKeyPolicy) -> JsonTable {
        let pool = create_test_pool().await;
        sqlx::query(
            "CREATE TABLE \"shelf\" (id INTEGER PRIMARY KEY AUTOINCREMENT, \"data\" TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO \"shelf\" (\"data\") VALUES (NULL)")
            .execute(&pool)
            .await
            .unwrap();
        let shelf = JsonTable::new(pool, "shelf", "data")
            .with_compiler(LookupCompiler::new(Backend::Generic).missing_keys(policy));
        shelf.insert(&tolkien()).await.unwrap();
        shelf.insert(&rowling()).await.unwrap();
        shelf
    }

    #[tokio::test]
    async fn test_missing_key_policy_negation() {
        let not_tolkien = [filter("data", tolkien())];

        let exclude = create_shelf(MissingKeyPolicy::Exclude).await;
        let (sql, _) = exclude.build_count_excluding(&[], &not_tolkien).unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM \"shelf\" WHERE NOT (\"data\" = ?)");
        // NOT (NULL = ?) is NULL, so the row without a document is dropped.
        assert_eq!(exclude.count_excluding(&[], &not_tolkien).await.unwrap(), 1);

        let guarded = create_shelf(MissingKeyPolicy::False).await;
        let (sql, _) = guarded.build_count_excluding(&[], &not_tolkien).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM \"shelf\" WHERE NOT (COALESCE(\"data\" = ?, FALSE))"
        );
        assert_eq!(guarded.count_excluding(&[], &not_tolkien).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_key_lookups_are_false_for_missing_documents() {
        let no_title = [filter("data__has_key", json!("title"))];
        for policy in [MissingKeyPolicy::Exclude, MissingKeyPolicy::False] {
            let shelf = create_shelf(policy).await;
            assert_eq!(shelf.count(&no_title).await.unwrap(), 2);
            assert_eq!(shelf.count_excluding(&[], &no_title).await.unwrap(), 1);
        }
    }
}
