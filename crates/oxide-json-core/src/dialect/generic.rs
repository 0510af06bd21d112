//! Generic text-only dialect.

use super::{Backend, JsonDialect};
use crate::builder::SqlFragment;
use crate::coerce::OutputType;
use crate::path::{member_path, PathSegment};

/// A generic dialect for backends that store JSON as text.
///
/// Documents are stored as canonical JSON text (see
/// [`canonical_json`](crate::coerce::canonical_json)), so whole-document
/// equality is text equality. The only JSON functions assumed are the
/// SQLite-style `json_type` and `json_extract`, used for top-level key
/// existence and for typed reads of the whole column. Paths inside
/// documents cannot be addressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl JsonDialect for GenericDialect {
    fn backend(&self) -> Backend {
        Backend::Generic
    }

    fn supports_paths(&self) -> bool {
        false
    }

    fn extract(
        &self,
        column: SqlFragment,
        segments: &[PathSegment],
        output: OutputType,
    ) -> SqlFragment {
        debug_assert!(segments.is_empty(), "path resolution guards generic extraction");
        let type_test = match output {
            OutputType::Json => return column,
            OutputType::Text => "= 'text'",
            OutputType::Numeric => "IN ('integer', 'real')",
            OutputType::Boolean => "IN ('true', 'false')",
        };
        column
            .clone()
            .wrap("CASE WHEN json_type(", &format!(") {type_test} THEN "))
            .append(column.wrap("json_extract(", ", '$')"))
            .push_raw(" END")
    }

    fn key_exists(&self, target: SqlFragment, key: &str) -> SqlFragment {
        target
            .wrap("json_type(", ", ")
            .push_param(member_path(&PathSegment::Key(key.to_string())))
            .push_raw(") IS NOT NULL")
    }
}
