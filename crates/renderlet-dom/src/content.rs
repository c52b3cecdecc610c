//! The content model handed from render functions to the wrapper.

#![forbid(unsafe_code)]

use crate::escape::escape_into;

/// Output of a render function.
///
/// The variant decides how the wrapper serializes the payload:
///
/// - [`Content::Text`] is always escaped. Arbitrary fetched data routed
///   through this variant can never inject markup.
/// - [`Content::Markup`] is emitted verbatim. Returning it is the caller's
///   explicit assertion that the string is trusted HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Plain text, escaped on serialization.
    Text(String),
    /// Trusted markup, serialized verbatim.
    Markup(String),
}

impl Content {
    /// The raw payload, before any escaping.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Content::Text(s) | Content::Markup(s) => s,
        }
    }

    /// Whether this content is trusted markup.
    #[must_use]
    pub fn is_markup(&self) -> bool {
        matches!(self, Content::Markup(_))
    }

    /// Whether serializing this content produces at least one child element.
    ///
    /// Text never does: escaping turns every `<` into `&lt;`. Markup does
    /// when it contains an element open delimiter, i.e. `<` immediately
    /// followed by an ASCII letter. Closing tags without an opener and
    /// stray `<` in prose do not count. The scan is lexical, not a parse.
    #[must_use]
    pub fn has_element(&self) -> bool {
        match self {
            Content::Text(_) => false,
            Content::Markup(m) => contains_element(m),
        }
    }

    /// Serializes this content into `out`, escaping text variants.
    pub(crate) fn write_html(&self, out: &mut String) {
        match self {
            Content::Text(s) => escape_into(out, s),
            Content::Markup(s) => out.push_str(s),
        }
    }
}

/// Lexical scan for an element open delimiter: `<` followed by an ASCII
/// letter. This mirrors how HTML tokenizers decide between a tag-open state
/// and literal text.
fn contains_element(markup: &str) -> bool {
    let bytes = markup.as_bytes();
    bytes
        .windows(2)
        .any(|w| w[0] == b'<' && w[1].is_ascii_alphabetic())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
