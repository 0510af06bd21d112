//! SQL forms each backend produces, and the lookups each one rejects.

mod common;
use common::*;

use oxide_json_core::dialect::{capability, LookupKind, Support};
use oxide_json_core::{
    Backend, CompilerConfig, JsonExtract, JsonLookupError, LookupCompiler, MissingKeyPolicy,
    Operator, OutputType, SqlValue,
};
use serde_json::json;

// ===================================================================
// Native forms
// ===================================================================

#[test]
fn postgres_native_operators() {
    assert_eq!(
        sql(Backend::Postgres, "data__contains", json!({"author": "Tolkien"})),
        "\"data\" @> $1::jsonb"
    );
    assert_eq!(
        sql(Backend::Postgres, "data__contained_by", json!({"author": "Tolkien"})),
        "\"data\" <@ $1::jsonb"
    );
    assert_eq!(
        sql(Backend::Postgres, "data__has_any_keys", json!(["title", "foo"])),
        "COALESCE(\"data\" ? $1 OR \"data\" ? $2, FALSE)"
    );
    assert_eq!(
        sql(Backend::Postgres, "data__title__icontains", json!("potter")),
        "LOWER(CASE WHEN jsonb_typeof(\"data\" -> $1) = 'string' \
         THEN (\"data\" ->> $2) END) LIKE LOWER($3)"
    );
}

#[test]
fn mysql_function_fallbacks() {
    let compiled = compile(Backend::MySql, "data__publication__year__gte", json!(1997));
    assert_eq!(
        compiled.sql(),
        "CASE WHEN JSON_TYPE(JSON_EXTRACT(JSON_EXTRACT(`data`, ?), ?)) \
         IN ('INTEGER', 'UNSIGNED INTEGER', 'DOUBLE', 'DECIMAL') \
         THEN CAST(JSON_EXTRACT(JSON_EXTRACT(`data`, ?), ?) AS DECIMAL(65, 30)) END >= ?"
    );
    let publication = SqlValue::Text("$.\"publication\"".into());
    let year = SqlValue::Text("$.\"year\"".into());
    assert_eq!(
        compiled.params(),
        &[
            publication.clone(),
            year.clone(),
            publication,
            year,
            SqlValue::Int(1997),
        ]
    );
    assert_eq!(
        sql(Backend::MySql, "data__has_keys", json!(["title", "author"])),
        "COALESCE(JSON_CONTAINS_PATH(`data`, 'one', ?) \
         AND JSON_CONTAINS_PATH(`data`, 'one', ?), FALSE)"
    );
}

#[test]
fn generic_text_fallbacks() {
    let compiled = compile(Backend::Generic, "data__has_key", json!("title"));
    assert_eq!(
        compiled.sql(),
        "COALESCE(json_type(\"data\", ?) IS NOT NULL, FALSE)"
    );
    assert_eq!(compiled.params()[0].as_text(), Some("$.\"title\""));

    let compiled = compile(Backend::Generic, "data", json!({"b": 1, "a": 2}));
    assert_eq!(compiled.sql(), "\"data\" = ?");
    assert_eq!(compiled.params()[0].as_text(), Some("{\"a\":2,\"b\":1}"));
}

// ===================================================================
// Rejections
// ===================================================================

#[test]
fn containment_rejected_without_native_support() {
    for backend in [Backend::MySql, Backend::Generic] {
        for (lookup, operator) in [
            ("data__contains", Operator::Contains),
            ("data__contained_by", Operator::ContainedBy),
        ] {
            assert_eq!(
                compile_err(backend, lookup, json!({"author": "Tolkien"})),
                JsonLookupError::UnsupportedOperator { operator, backend }
            );
        }
    }
}

#[test]
fn generic_rejects_everything_but_equality_and_has_key() {
    let cases = [
        ("data__iexact", json!("x")),
        ("data__has_keys", json!(["title"])),
        ("data__has_any_keys", json!(["title"])),
        ("data__startswith", json!("x")),
        ("data__icontains", json!("x")),
        ("data__gt", json!(1)),
        ("data__in", json!([1])),
    ];
    for (lookup, operand) in cases {
        assert!(
            matches!(
                compile_err(Backend::Generic, lookup, operand),
                JsonLookupError::UnsupportedOperator { backend: Backend::Generic, .. }
            ),
            "{lookup} should be rejected"
        );
    }
}

#[test]
fn generic_rejects_nested_paths() {
    assert_eq!(
        compile_err(Backend::Generic, "data__publication__year", json!(1997)),
        JsonLookupError::UnsupportedPath {
            backend: Backend::Generic
        }
    );
}

#[test]
fn capability_table_matches_compiler() {
    assert_eq!(capability(Backend::Postgres, LookupKind::Containment), Support::Native);
    assert!(!capability(Backend::MySql, LookupKind::Containment).is_supported());
    assert!(capability(Backend::Generic, LookupKind::KeyExists).is_supported());
    assert!(!capability(Backend::Generic, LookupKind::Comparison).is_supported());
}

// ===================================================================
// Determinism and configuration
// ===================================================================

#[test]
fn compilation_is_deterministic() {
    init_tracing();
    let filter = filter("data__publication__year__in", json!([1997, 1998]));
    for backend in [Backend::Postgres, Backend::MySql] {
        let compiler = LookupCompiler::new(backend);
        let first = compiler.compile(&filter).unwrap();
        let second = compiler.compile(&filter).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn extraction_fragment_is_shared_by_filters() {
    let compiler = LookupCompiler::new(Backend::MySql);
    let year = JsonExtract::new("data", ["publication", "year"]).output(OutputType::Numeric);
    let projection = compiler.compile_extract(&year).unwrap();
    let filter = compiler.compile(&year.filter(Operator::Gt, 1900)).unwrap();
    assert_eq!(filter.sql(), format!("{} > ?", projection.sql()));
    assert_eq!(projection.params().len(), 4);
    assert_eq!(&filter.params()[..4], projection.params());
}

#[test]
fn config_drives_backend_and_policy() {
    let config = CompilerConfig::from_json(
        r#"{
            "ENGINE": "django.db.backends.postgresql",
            "missing_keys": "false",
            "param_offset": 1
        }"#,
    )
    .unwrap();
    let compiler = LookupCompiler::from_config(&config).unwrap();
    assert_eq!(compiler.backend(), Backend::Postgres);
    assert_eq!(
        compiler
            .compile(&filter("data__author", json!("Tolkien")))
            .unwrap()
            .sql(),
        "COALESCE(CASE WHEN jsonb_typeof(\"data\" -> $2) = 'string' \
         THEN (\"data\" ->> $3) END = $4, FALSE)"
    );
}

#[test]
fn unknown_engine_is_rejected() {
    assert!(matches!(
        LookupCompiler::for_engine("django.db.backends.oracle"),
        Err(JsonLookupError::UnknownBackend(_))
    ));
    assert_eq!(
        LookupCompiler::new(Backend::Generic)
            .missing_keys(MissingKeyPolicy::False)
            .backend(),
        Backend::Generic
    );
}
