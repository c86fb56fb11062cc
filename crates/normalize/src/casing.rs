//! Key casing helpers.

/// Canonical snake_case form of a UI key.
///
/// An underscore is inserted where a lowercase letter or digit is followed by
/// an uppercase letter, runs of underscores collapse to one, and everything
/// is lowercased: `buyersCompanyName` → `buyers_company_name`,
/// `Country__Code` → `country_code`.
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;

    for ch in key.chars() {
        if ch == '_' {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else if ch.is_uppercase() {
            if prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        prev = Some(ch);
    }

    out
}

pub(crate) fn lowercase(key: &str) -> String {
    key.to_lowercase()
}

pub(crate) fn strip_underscores(key: &str) -> String {
    key.replace('_', "")
}
