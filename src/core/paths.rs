//! Canonicalization and prefix arithmetic for `/`-segmented vault paths.
//!
//! Member paths, focus paths and STRICT patterns all come from user input and
//! may carry stray whitespace, a trailing separator or duplicates. Every
//! comparison downstream goes through [`normalize`] first.

use std::collections::HashSet;

pub const SEPARATOR: char = '/';

/// Trims whitespace and strips one trailing `/`. Blank input yields `""`.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed
        .strip_suffix(SEPARATOR)
        .unwrap_or(trimmed)
        .to_string()
}

/// Normalizes every value, drops empties and deduplicates, keeping first-seen order.
pub fn normalize_all<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();

    for value in values {
        let candidate = normalize(value.as_ref());
        if candidate.is_empty() || !seen.insert(candidate.clone()) {
            continue;
        }
        normalized.push(candidate);
    }

    normalized
}

/// Like [`normalize_all`], but over untyped persisted data: non-string
/// elements (and a non-array value) are skipped rather than rejected.
pub fn normalize_json(value: &serde_json::Value) -> Vec<String> {
    match value.as_array() {
        Some(items) => normalize_all(items.iter().filter_map(|item| item.as_str())),
        None => Vec::new(),
    }
}

/// Returns the parent of `path`, or `None` for a top-level path.
pub fn parent(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|idx| &path[..idx])
}

/// Iterates over every proper ancestor of `path`, nearest first.
///
/// `"a/b/c.md"` yields `"a/b"` then `"a"`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut current = path;
    std::iter::from_fn(move || {
        let next = parent(current)?;
        current = next;
        Some(next)
    })
    .filter(|ancestor| !ancestor.is_empty())
}

/// `true` if `path` lies strictly below `prefix`.
///
/// The match is bounded by a separator: `"foo/x.md"` descends from `"foo"`,
/// `"foo2/x.md"` does not.
pub fn is_strict_descendant(path: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && path.len() > prefix.len() + 1
        && path.starts_with(prefix)
        && path[prefix.len()..].starts_with(SEPARATOR)
}

/// `true` if `path` equals `prefix` or descends from it.
pub fn is_same_or_descendant(path: &str, prefix: &str) -> bool {
    path == prefix || is_strict_descendant(path, prefix)
}

/// Moves `path` from under `old` to under `new`.
///
/// Returns `None` when `path` is neither `old` nor one of its descendants.
pub fn rebase(path: &str, old: &str, new: &str) -> Option<String> {
    if path == old {
        return Some(new.to_string());
    }
    if is_strict_descendant(path, old) {
        return Some(format!("{new}{}", &path[old.len()..]));
    }
    None
}

/// The last segment of `path`.
pub fn file_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_trims_and_strips_one_trailing_separator() {
        assert_eq!(normalize("  notes/ "), "notes");
        assert_eq!(normalize("notes//"), "notes/");
        assert_eq!(normalize("a/b.md"), "a/b.md");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_all_dedupes_in_first_seen_order() {
        let normalized = normalize_all(["b/", "a", " b", "", "a/", "c"]);
        assert_eq!(normalized, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_normalize_json_skips_non_strings() {
        let value = json!(["a/", 3, null, "b", {"x": 1}, "a"]);
        assert_eq!(normalize_json(&value), vec!["a", "b"]);
        assert!(normalize_json(&json!("a")).is_empty());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let found: Vec<_> = ancestors("a/b/c.md").collect();
        assert_eq!(found, vec!["a/b", "a"]);
        assert_eq!(ancestors("top.md").count(), 0);
    }

    #[test]
    fn test_descendant_check_is_separator_bounded() {
        assert!(is_strict_descendant("foo/x.md", "foo"));
        assert!(!is_strict_descendant("foo2/x.md", "foo"));
        assert!(!is_strict_descendant("foo", "foo"));
        assert!(!is_strict_descendant("foo/", "foo"));
        assert!(!is_strict_descendant("foo/x.md", ""));
        assert!(is_same_or_descendant("foo", "foo"));
    }

    #[test]
    fn test_rebase_preserves_remainder() {
        assert_eq!(rebase("foo/x.md", "foo", "bar"), Some("bar/x.md".to_string()));
        assert_eq!(rebase("foo", "foo", "bar"), Some("bar".to_string()));
        assert_eq!(rebase("foo2/x.md", "foo", "bar"), None);
        assert_eq!(
            rebase("a/b/c/d.md", "a/b", "z"),
            Some("z/c/d.md".to_string())
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("a/b/c.md"), "c.md");
        assert_eq!(file_name("c.md"), "c.md");
    }
}
