//! Compiler configuration.

use serde::{Deserialize, Serialize};

use crate::dialect::Backend;
use crate::error::Result;

/// How predicates on absent keys behave.
///
/// Key-existence lookups are always two-valued: an absent key yields false.
/// This policy decides what the remaining lookups do when their path is
/// missing from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Leave the engine's NULL in place. The row is excluded by a filter and
    /// also by a negated filter.
    #[default]
    Exclude,
    /// Fold NULL to FALSE, so a negated filter includes the row.
    False,
}

/// Settings for a [`LookupCompiler`](crate::LookupCompiler).
///
/// ```rust
/// use oxide_json_core::{Backend, CompilerConfig, MissingKeyPolicy};
///
/// let config = CompilerConfig::from_json(
///     r#"{"ENGINE": "django.db.backends.mysql", "missing_keys": "false"}"#,
/// ).unwrap();
/// assert_eq!(config.backend().unwrap(), Backend::MySql);
/// assert_eq!(config.missing_keys, MissingKeyPolicy::False);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Backend identifier reported by the active connection.
    #[serde(alias = "engine", alias = "ENGINE")]
    pub backend: String,
    /// Policy for lookups on absent keys.
    pub missing_keys: MissingKeyPolicy,
    /// Parameters already bound by the enclosing query.
    pub param_offset: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            backend: String::from("generic"),
            missing_keys: MissingKeyPolicy::default(),
            param_offset: 0,
        }
    }
}

impl CompilerConfig {
    /// Creates a configuration for a backend identifier.
    #[must_use]
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolves the configured backend identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JsonLookupError::UnknownBackend`](crate::JsonLookupError::UnknownBackend)
    /// for unrecognised identifiers.
    pub fn backend(&self) -> Result<Backend> {
        Backend::from_engine(&self.backend)
    }
}
