//! `LIKE` pattern construction.

/// Where the operand must occur in the matched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PatternShape {
    Contains,
    StartsWith,
    EndsWith,
}

/// Escapes `LIKE` wildcards with a backslash.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the full pattern for `text` (`%text%`, `text%` or `%text`).
pub(crate) fn like_pattern(shape: PatternShape, text: &str) -> String {
    let escaped = escape_like(text);
    match shape {
        PatternShape::Contains => format!("%{escaped}%"),
        PatternShape::StartsWith => format!("{escaped}%"),
        PatternShape::EndsWith => format!("%{escaped}"),
    }
}
