//! Host-surface primitives for renderlet: a retained wrapper node, the
//! content model produced by render functions, and HTML text escaping.
//!
//! This crate is deliberately small and framework-free. The component crate
//! mutates a [`Wrapper`] in place; embedders read it back out either
//! structurally (tag, attributes, content) or serialized via
//! [`Wrapper::to_html`].
//!
//! # Design
//!
//! - [`Content`] is a tagged value: either plain text that is always escaped
//!   on serialization, or markup that is emitted verbatim. Which variant a
//!   render function returns is an explicit, type-level decision.
//! - [`Wrapper`] owns one optional [`Content`] plus the accessibility
//!   attributes the component guarantees (`aria-live`). It never parses HTML;
//!   the one structural query it answers ([`Wrapper::has_element_child`]) is
//!   a lexical scan.
//!
//! # Invariants
//!
//! - Serialized output of [`Content::Text`] contains no unescaped `<`, `>`,
//!   `"`, `'`, or `&`.
//! - `aria-live` appears exactly once in serialized output and is controlled
//!   solely by [`Wrapper::set_aria_live`]; pass-through attributes cannot
//!   override it.

#![forbid(unsafe_code)]

mod content;
mod escape;
mod wrapper;

pub use content::Content;
pub use escape::{escape, escape_into};
pub use wrapper::{ParsePolitenessError, Politeness, Wrapper};
