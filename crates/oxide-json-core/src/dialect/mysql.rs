//! MySQL dialect.
//!
//! MySQL has no JSON operators usable for lookups, so every lookup goes
//! through its JSON functions: one `JSON_EXTRACT` per path segment,
//! `JSON_UNQUOTE` for text, `JSON_CONTAINS_PATH` for key existence. Typed
//! reads check `JSON_TYPE` first, since `CAST` turns non-numeric strings into
//! zero instead of failing.

use super::{Backend, JsonDialect};
use crate::builder::SqlFragment;
use crate::coerce::OutputType;
use crate::path::{member_path, PathSegment};

/// MySQL dialect using JSON function fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl JsonDialect for MySqlDialect {
    fn backend(&self) -> Backend {
        Backend::MySql
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn json_literal(&self, literal: SqlFragment) -> SqlFragment {
        literal.wrap("CAST(", " AS JSON)")
    }

    fn extract(
        &self,
        column: SqlFragment,
        segments: &[PathSegment],
        output: OutputType,
    ) -> SqlFragment {
        let json = segments.iter().fold(column, |chain, segment| {
            chain
                .wrap("JSON_EXTRACT(", ", ")
                .push_param(member_path(segment))
                .push_raw(")")
        });
        match output {
            OutputType::Json => json,
            OutputType::Text => typed(
                json.clone(),
                "= 'STRING'",
                json.wrap("JSON_UNQUOTE(", ")"),
            ),
            OutputType::Numeric => typed(
                json.clone(),
                "IN ('INTEGER', 'UNSIGNED INTEGER', 'DOUBLE', 'DECIMAL')",
                json.wrap("CAST(", " AS DECIMAL(65, 30))"),
            ),
            OutputType::Boolean => typed(
                json.clone(),
                "= 'BOOLEAN'",
                json.wrap("(", " = CAST('true' AS JSON))"),
            ),
        }
    }

    fn key_exists(&self, target: SqlFragment, key: &str) -> SqlFragment {
        target
            .wrap("JSON_CONTAINS_PATH(", ", 'one', ")
            .push_param(member_path(&PathSegment::Key(key.to_string())))
            .push_raw(")")
    }
}

/// `value` when `JSON_TYPE(json)` passes `type_test`, NULL otherwise.
fn typed(json: SqlFragment, type_test: &str, value: SqlFragment) -> SqlFragment {
    json.wrap("CASE WHEN JSON_TYPE(", &format!(") {type_test} THEN "))
        .append(value)
        .push_raw(" END")
}
