//! Per-backend lookup capabilities.

use std::fmt;

use self::LookupKind::{
    AllKeysExist, AnyKeyExists, CaseInsensitiveEquality, CaseInsensitivePattern, Comparison,
    ContainedBy, Containment, Equality, KeyExists, Membership, PatternMatch,
};
use self::Support::{Fallback, Native, Unsupported};
use super::Backend;

/// What a lookup compiles to once its operand has been classified.
///
/// `contains` maps to [`LookupKind::Containment`] for documents and to
/// [`LookupKind::PatternMatch`] for strings, since backends support the two
/// very differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Equality of a value or a whole document.
    Equality,
    /// Equality after case folding.
    CaseInsensitiveEquality,
    /// Structural superset test.
    Containment,
    /// Structural subset test.
    ContainedBy,
    /// One top-level key exists.
    KeyExists,
    /// Every one of several keys exists.
    AllKeysExist,
    /// At least one of several keys exists.
    AnyKeyExists,
    /// `LIKE` over extracted text.
    PatternMatch,
    /// `LIKE` over case-folded extracted text.
    CaseInsensitivePattern,
    /// Ordering comparison.
    Comparison,
    /// Membership in a literal list.
    Membership,
}

/// How a backend handles a lookup kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Native JSON operators.
    Native,
    /// Emulated with the named SQL function.
    Fallback(&'static str),
    /// Not expressible; compilation fails.
    Unsupported,
}

impl Support {
    /// Returns whether the lookup can be compiled at all.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Fallback(function) => write!(f, "fallback via {function}"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}

static CAPABILITIES: &[(Backend, LookupKind, Support)] = &[
    (Backend::Postgres, Equality, Native),
    (Backend::Postgres, CaseInsensitiveEquality, Native),
    (Backend::Postgres, Containment, Native),
    (Backend::Postgres, ContainedBy, Native),
    (Backend::Postgres, KeyExists, Native),
    (Backend::Postgres, AllKeysExist, Native),
    (Backend::Postgres, AnyKeyExists, Native),
    (Backend::Postgres, PatternMatch, Native),
    (Backend::Postgres, CaseInsensitivePattern, Native),
    (Backend::Postgres, Comparison, Native),
    (Backend::Postgres, Membership, Native),
    (Backend::MySql, Equality, Fallback("JSON_EXTRACT")),
    (Backend::MySql, CaseInsensitiveEquality, Fallback("LOWER")),
    (Backend::MySql, Containment, Unsupported),
    (Backend::MySql, ContainedBy, Unsupported),
    (Backend::MySql, KeyExists, Fallback("JSON_CONTAINS_PATH")),
    (Backend::MySql, AllKeysExist, Fallback("JSON_CONTAINS_PATH")),
    (Backend::MySql, AnyKeyExists, Fallback("JSON_CONTAINS_PATH")),
    (Backend::MySql, PatternMatch, Fallback("JSON_UNQUOTE")),
    (Backend::MySql, CaseInsensitivePattern, Fallback("LOWER")),
    (Backend::MySql, Comparison, Fallback("CAST")),
    (Backend::MySql, Membership, Fallback("CAST")),
    (Backend::Generic, Equality, Fallback("canonical text")),
    (Backend::Generic, KeyExists, Fallback("json_type")),
];

/// Looks up the support for `kind` on `backend`.
///
/// Pairs missing from the table are unsupported.
#[must_use]
pub fn capability(backend: Backend, kind: LookupKind) -> Support {
    CAPABILITIES
        .iter()
        .find(|(b, k, _)| *b == backend && *k == kind)
        .map_or(Unsupported, |(_, _, support)| *support)
}
