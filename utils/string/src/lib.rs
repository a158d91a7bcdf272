//! Small string helpers shared by the type namer and category classifier.

/// Lowercases `key` and replaces every space with an underscore.
///
/// Non-empty input always yields non-empty output.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase().replace(' ', "_")
}

/// Returns the non-empty part of `value` that precedes `suffix`.
pub fn strip_non_empty_suffix<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    value.strip_suffix(suffix).filter(|base| !base.is_empty())
}

/// Truncate a string to at most `max_chars` characters, appending `...`
/// when anything was cut.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut chars = value.char_indices();
    match chars.nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}
