//! HTML text escaping.
//!
//! Thin wrappers over [`v_htmlescape`] so the rest of the workspace never
//! touches the escaping crate directly.

#![forbid(unsafe_code)]

use std::fmt::Write as _;

/// Escapes `value` for use as HTML text or as a double-quoted attribute
/// value.
///
/// Escapes `&`, `<`, `>`, `"`, `'`, and `/`.
#[must_use]
pub fn escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// Appends the escaped form of `value` to `out` without an intermediate
/// allocation.
pub fn escape_into(out: &mut String, value: &str) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", v_htmlescape::escape(value));
}

// ─── Tests ───────────────────────────────────────────────────────────────────
