//! Identifier normalization.
//!
//! Query and parameter names are written in whatever style the SQL file
//! prefers (`get-user!`, `user-id`, `OrderBy`). Generated code needs legal
//! Rust identifiers, so every name goes through [`to_ident`].

/// Rust keywords, strict and reserved (2024 edition).
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Normalize a name into a snake_case Rust identifier.
///
/// Returns `None` when nothing identifier-like is left.
///
/// ```
/// use sqlsheet::ident::to_ident;
///
/// assert_eq!(to_ident("get-user!").as_deref(), Some("get_user"));
/// assert_eq!(to_ident("type").as_deref(), Some("type_"));
/// ```
pub fn to_ident(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        match c {
            '!' | '?' => {}
            c if c.is_ascii_alphanumeric() => out.push(c.to_ascii_lowercase()),
            _ => {
                if !out.is_empty() && !out.ends_with('_') {
                    out.push('_');
                }
            }
        }
    }

    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        return None;
    }

    let mut ident = String::with_capacity(trimmed.len() + 1);
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        ident.push('_');
    }
    ident.push_str(trimmed);

    if KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    Some(ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lisp_style_names() {
        assert_eq!(to_ident("get-user-by-id").as_deref(), Some("get_user_by_id"));
        assert_eq!(to_ident("set-email!").as_deref(), Some("set_email"));
        assert_eq!(to_ident("active?").as_deref(), Some("active"));
    }

    #[test]
    fn test_case_and_separators() {
        assert_eq!(to_ident("OrderBy").as_deref(), Some("orderby"));
        assert_eq!(to_ident("user--id").as_deref(), Some("user_id"));
        assert_eq!(to_ident("_private_").as_deref(), Some("private"));
        assert_eq!(to_ident("a.b c").as_deref(), Some("a_b_c"));
    }

    #[test]
    fn test_leading_digit_and_keywords() {
        assert_eq!(to_ident("2fa-codes").as_deref(), Some("_2fa_codes"));
        assert_eq!(to_ident("match").as_deref(), Some("match_"));
        assert_eq!(to_ident("gen").as_deref(), Some("gen_"));
    }

    #[test]
    fn test_nothing_left() {
        assert_eq!(to_ident("!?"), None);
        assert_eq!(to_ident("--"), None);
        assert_eq!(to_ident(""), None);
    }
}
