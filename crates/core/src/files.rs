//! Uploaded file naming.

use crate::types::DbId;

/// Fallback name when sanitizing leaves nothing.
const FALLBACK_NAME: &str = "file";

/// Make a user-supplied file name safe for use as an object-store key.
///
/// Whitespace runs become `_`, anything outside `[A-Za-z0-9._-]` becomes `_`,
/// repeated underscores collapse and leading/trailing underscores are
/// dropped.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let mapped = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
            c
        } else {
            '_'
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Object-store key for an upload: `{owner}/{unix_millis}_{sanitized}`.
pub fn storage_key(owner: DbId, unix_millis: i64, sanitized: &str) -> String {
    format!("{owner}/{unix_millis}_{sanitized}")
}
