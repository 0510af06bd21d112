//! Error types for lookup compilation.

use thiserror::Error;

use crate::dialect::Backend;
use crate::lookup::Operator;

/// Errors raised while compiling a JSON lookup.
///
/// Every variant is produced at query construction time, before anything is
/// sent to the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonLookupError {
    /// The operator has neither a native nor a fallback form on the backend.
    #[error("operator `{operator}` is not supported on the {backend} backend")]
    UnsupportedOperator {
        /// The rejected operator.
        operator: Operator,
        /// The active backend.
        backend: Backend,
    },

    /// The backend cannot address nested paths inside a JSON document.
    #[error("the {backend} backend cannot address paths inside JSON documents")]
    UnsupportedPath {
        /// The active backend.
        backend: Backend,
    },

    /// The operand does not fit the operator.
    #[error("malformed operand for `{operator}`: {reason}")]
    MalformedOperand {
        /// The operator the operand was given to.
        operator: Operator,
        /// What was wrong with it.
        reason: String,
    },

    /// A lookup string could not be parsed.
    #[error("invalid lookup: {0}")]
    InvalidLookup(String),

    /// A backend identifier did not match any known dialect.
    #[error("unknown database backend: {0}")]
    UnknownBackend(String),
}

impl JsonLookupError {
    pub(crate) fn malformed(operator: Operator, reason: impl Into<String>) -> Self {
        Self::MalformedOperand {
            operator,
            reason: reason.into(),
        }
    }
}

/// Result type alias for lookup compilation.
pub type Result<T> = std::result::Result<T, JsonLookupError>;
