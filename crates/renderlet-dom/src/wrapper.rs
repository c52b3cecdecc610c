//! The retained wrapper node the component mounts content into.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::content::Content;
use crate::escape::escape_into;

/// Value of the wrapper's `aria-live` attribute.
///
/// Controls how assistive technology announces content swaps inside the
/// wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Politeness {
    /// Updates are not announced.
    Off,
    /// Updates are announced at the next graceful opportunity.
    #[default]
    Polite,
    /// Updates interrupt whatever is currently being announced.
    Assertive,
}

impl Politeness {
    /// The literal attribute value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Politeness::Off => "off",
            Politeness::Polite => "polite",
            Politeness::Assertive => "assertive",
        }
    }
}

impl fmt::Display for Politeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Politeness {
    type Err = ParsePolitenessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Politeness::Off),
            "polite" => Ok(Politeness::Polite),
            "assertive" => Ok(Politeness::Assertive),
            other => Err(ParsePolitenessError(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`Politeness`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolitenessError(String);

impl fmt::Display for ParsePolitenessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid aria-live value {:?} (expected off, polite, or assertive)",
            self.0
        )
    }
}

impl std::error::Error for ParsePolitenessError {}

/// A single retained element the component owns for its lifetime.
///
/// The wrapper keeps its tag, pass-through attributes, `aria-live` value,
/// and current content as plain data. Mutation happens through the setters;
/// [`Wrapper::to_html`] serializes the whole node on demand.
///
/// # Invariants
///
/// - `aria-live` is always present in serialized output, exactly once.
/// - Pass-through attributes keep their insertion order and cannot name
///   `aria-live`.
/// - Attribute values and [`Content::Text`] payloads are escaped on
///   serialization; attribute names are validated on insertion instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    tag: String,
    attrs: Vec<(String, String)>,
    aria_live: Politeness,
    content: Option<Content>,
}

impl Wrapper {
    /// A `<div>` wrapper with polite announcements and no content.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tag("div")
    }

    /// A wrapper with a custom tag name.
    #[must_use]
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            aria_live: Politeness::default(),
            content: None,
        }
    }

    /// The wrapper's tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Inserts a pass-through attribute, replacing the value in place when
    /// the name is already present.
    ///
    /// Returns `false` without inserting when `name` is not a valid
    /// attribute name or names `aria-live` (case-insensitively); the
    /// announcement attribute is owned by [`Wrapper::set_aria_live`].
    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if !valid_attr_name(&name) || name.eq_ignore_ascii_case("aria-live") {
            return false;
        }
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
        true
    }

    /// The pass-through attributes in insertion order.
    #[must_use]
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Sets the announcement politeness.
    pub fn set_aria_live(&mut self, politeness: Politeness) {
        self.aria_live = politeness;
    }

    /// The current announcement politeness.
    #[must_use]
    pub fn aria_live(&self) -> Politeness {
        self.aria_live
    }

    /// Replaces the wrapper's content. `None` empties the wrapper.
    pub fn set_content(&mut self, content: Option<Content>) {
        self.content = content;
    }

    /// The current content, if any.
    #[must_use]
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Whether the wrapper currently holds at least one child element.
    ///
    /// See [`Content::has_element`] for what counts as an element.
    #[must_use]
    pub fn has_element_child(&self) -> bool {
        self.content.as_ref().is_some_and(Content::has_element)
    }

    /// Serializes the wrapper and its content to an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(&mut out, value);
            out.push('"');
        }
        out.push_str(" aria-live=\"");
        out.push_str(self.aria_live.as_str());
        out.push_str("\">");
        if let Some(content) = &self.content {
            content.write_html(&mut out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
        out
    }
}

impl Default for Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts the HTML attribute-name charset: a leading ASCII letter followed
/// by letters, digits, `-`, `_`, `:` or `.`.
fn valid_attr_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
