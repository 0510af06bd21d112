//! PostgreSQL `jsonb` dialect.
//!
//! Typed reads are guarded by `jsonb_typeof`, so a value of another JSON type
//! reads as NULL instead of failing the cast.

use super::{Backend, JsonDialect};
use crate::builder::SqlFragment;
use crate::coerce::OutputType;
use crate::path::PathSegment;

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl JsonDialect for PostgresDialect {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn json_literal(&self, literal: SqlFragment) -> SqlFragment {
        literal.push_raw("::jsonb")
    }

    fn extract(
        &self,
        column: SqlFragment,
        segments: &[PathSegment],
        output: OutputType,
    ) -> SqlFragment {
        let chain = segments
            .iter()
            .fold(column.clone(), |chain, segment| step(chain, "->", segment));
        let json = if segments.is_empty() {
            chain.clone()
        } else {
            chain.clone().paren()
        };

        match output {
            OutputType::Json => json,
            OutputType::Text => {
                let text = match segments.split_last() {
                    Some((last, init)) => init
                        .iter()
                        .fold(column, |chain, segment| step(chain, "->", segment))
                        .push_raw(" ->> ")
                        .append(key_or_index(last))
                        .paren(),
                    None => column.push_raw(" #>> '{}'"),
                };
                typed(chain, "string", text)
            }
            OutputType::Numeric => typed(chain, "number", json.push_raw("::numeric")),
            OutputType::Boolean => typed(chain, "boolean", json.push_raw("::boolean")),
        }
    }

    fn key_exists(&self, target: SqlFragment, key: &str) -> SqlFragment {
        target.binary("?", SqlFragment::param(key))
    }

    fn containment(
        &self,
        left: SqlFragment,
        right: SqlFragment,
        reversed: bool,
    ) -> Option<SqlFragment> {
        let op = if reversed { "<@" } else { "@>" };
        Some(left.binary(op, right))
    }
}

fn key_or_index(segment: &PathSegment) -> SqlFragment {
    match segment {
        PathSegment::Key(key) => SqlFragment::param(key.as_str()),
        PathSegment::Index(i) => SqlFragment::raw(i.to_string()),
    }
}

fn step(chain: SqlFragment, op: &str, segment: &PathSegment) -> SqlFragment {
    chain.binary(op, key_or_index(segment))
}

/// `value` when `json` has the given `jsonb_typeof` name, NULL otherwise.
fn typed(json: SqlFragment, type_name: &str, value: SqlFragment) -> SqlFragment {
    json.wrap(
        "CASE WHEN jsonb_typeof(",
        &format!(") = '{type_name}' THEN "),
    )
    .append(value)
    .push_raw(" END")
}
