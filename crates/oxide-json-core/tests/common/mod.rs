#![allow(dead_code)]

use oxide_json_core::{
    Backend, CompiledExpression, FilterExpression, JsonLookupError, LookupCompiler,
};
use serde_json::{json, Value};

pub fn tolkien() -> Value {
    json!({
        "title": "The Lord of the Rings",
        "author": "Tolkien",
        "publication": {"year": 1954, "publisher": "Allen & Unwin"},
        "tags": ["fantasy", "epic"]
    })
}

pub fn rowling() -> Value {
    json!({
        "title": "Harry Potter",
        "author": "Rowling",
        "publication": {"year": 1997, "publisher": "Bloomsbury"},
        "tags": ["fantasy", "school"]
    })
}

pub fn books() -> Vec<Value> {
    vec![tolkien(), rowling()]
}

pub fn filter(lookup: &str, operand: Value) -> FilterExpression {
    FilterExpression::parse(lookup, operand)
        .unwrap_or_else(|e| panic!("Failed to parse lookup: {lookup}\nError: {e:?}"))
}

/// Number of fixture books the filter matches in memory.
pub fn count(lookup: &str, operand: Value) -> usize {
    let filter = filter(lookup, operand);
    books().iter().filter(|doc| filter.matches(doc)).count()
}

pub fn compile(backend: Backend, lookup: &str, operand: Value) -> CompiledExpression {
    LookupCompiler::new(backend)
        .compile(&filter(lookup, operand))
        .unwrap_or_else(|e| panic!("Failed to compile {lookup} on {backend}\nError: {e:?}"))
}

pub fn compile_err(backend: Backend, lookup: &str, operand: Value) -> JsonLookupError {
    LookupCompiler::new(backend)
        .compile(&filter(lookup, operand))
        .expect_err(&format!("Expected {lookup} to fail on {backend}"))
}

pub fn sql(backend: Backend, lookup: &str, operand: Value) -> String {
    compile(backend, lookup, operand).sql().to_string()
}

/// Installs a test subscriber honouring `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
