//! Turning fetched JSON into wrapper content.

#![forbid(unsafe_code)]

use std::rc::Rc;

use renderlet_dom::Content;
use serde_json::Value;

/// A render function: pure mapping from the latest fetched value to wrapper
/// content.
///
/// Called on the owner thread each time a fetch outcome is applied. The
/// returned variant decides trust: [`Content::Text`] is escaped,
/// [`Content::Markup`] is mounted verbatim.
pub type RenderFn = Rc<dyn Fn(&Value) -> Content>;

/// Fallback render used when none is configured: the value serialized as
/// compact JSON, mounted as escaped text.
#[must_use]
pub fn default_render(value: &Value) -> Content {
    Content::Text(value.to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
