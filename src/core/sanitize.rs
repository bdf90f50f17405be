// src/core/sanitize.rs
//! Small text cleanups shared by extraction and export.

/// Whitespace runs (NBSP and newlines included) become one space; ends trimmed.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// File stem from a recipe or table name: ASCII letters, digits, `-` and `_`
/// survive, whitespace runs become `_`, everything else is dropped.
pub fn sanitize_file_stem(name: &str, fallback: &str) -> String {
    let words: Vec<String> = name
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_')).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect();
    let stem = words.join("_");
    let stem = stem.trim_matches('_');
    if stem.is_empty() { s!(fallback) } else { s!(stem) }
}

/// Text with every `[...]` tag removed (`[1]`, `[note 2]`). Brackets do not nest.
pub fn strip_brackets(s: &str) -> String {
    let mut in_tag = false;
    let kept: String = s
        .chars()
        .filter(|&c| match c {
            '[' => {
                in_tag = true;
                false
            }
            ']' => {
                in_tag = false;
                false
            }
            _ => !in_tag,
        })
        .collect();
    s!(kept.trim())
}

/// Comparison key for header labels: no footnotes, squished, lowercase.
pub fn header_key(s: &str) -> String {
    normalize_ws(&strip_brackets(s)).to_lowercase()
}
