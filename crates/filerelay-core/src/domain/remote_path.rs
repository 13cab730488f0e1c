//! Remote path helpers
//!
//! Remote stores always use `/` as separator. Caller input may contain
//! Windows-style `\` separators, which are normalised here.

use super::errors::DomainError;

/// Returns true when the value is empty or whitespace only.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Rejects a path parameter that is empty or whitespace only.
pub fn validate_parameter(value: &str, name: &str) -> Result<(), DomainError> {
    if is_blank(value) {
        return Err(DomainError::blank_parameter(name));
    }
    Ok(())
}

/// Joins two path segments with a single `/`.
///
/// A rooted `child` replaces `base`; an empty side yields the other side.
pub fn combine(base: &str, child: &str) -> String {
    let joined = if base.is_empty() || child.starts_with(['/', '\\']) {
        child.to_string()
    } else if child.is_empty() {
        base.to_string()
    } else if base.ends_with(['/', '\\']) {
        format!("{base}{child}")
    } else {
        format!("{base}/{child}")
    };
    normalize_separators(&joined)
}

/// Prefixes a caller-relative path with the configured root folder.
pub fn join_root(root: &str, relative: &str) -> String {
    combine(root, relative)
}

/// Splits `a/b/c.txt` into (`a/b`, `c.txt`).
///
/// A path without separator has an empty folder part.
pub fn split(path: &str) -> (String, String) {
    let normalized = normalize_separators(path);
    match normalized.rfind('/') {
        Some(0) => ("/".to_string(), normalized[1..].to_string()),
        Some(idx) => (
            normalized[..idx].to_string(),
            normalized[idx + 1..].to_string(),
        ),
        None => (String::new(), normalized),
    }
}

/// Replaces every `\` with `/`.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
