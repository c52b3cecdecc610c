#![forbid(unsafe_code)]

//! Fetch-and-render views: fetch JSON from a source, hand it to a render
//! function, and keep exactly the latest result mounted in a retained
//! wrapper.
//!
//! A view is configured with [`Renderlet`], mounted into a ([`View`],
//! [`RefreshHandle`]) pair, and driven by the owner thread through
//! [`View::tick`] / [`View::tick_deadline`]. Fetches run on short-lived
//! worker threads; outcomes are folded in on the owner thread, and a
//! sequence counter guarantees that out of overlapping invocations only the
//! latest started one can apply. Lifecycle callbacks (`on_loading`,
//! `on_ready`, `on_refresh`, `on_error`, plus `on_attach` / `on_detach`)
//! fire on the owner thread with no internal borrow held.
//!
//! Render output is a tagged [`Content`]: plain text is escaped on
//! serialization, markup is mounted verbatim. The wrapper always carries an
//! `aria-live` announcement attribute.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use renderlet::{Content, Phase, Renderlet};
//! use serde_json::{Value, json};
//!
//! let (view, handle) = Renderlet::new()
//!     .src("demo://greeting")
//!     .fetch_with(|_src, _refresh| Ok(json!({ "name": "world" })))
//!     .render_with(|value: &Value| {
//!         Content::Markup(format!(
//!             "<p>hello {}</p>",
//!             value["name"].as_str().unwrap_or("?")
//!         ))
//!     })
//!     .mount();
//!
//! while view.phase() == Phase::Loading {
//!     view.tick_deadline(Duration::from_secs(5));
//! }
//! assert!(view.html().contains("hello world"));
//!
//! handle.refresh();
//! while view.phase() == Phase::Loading {
//!     view.tick_deadline(Duration::from_secs(5));
//! }
//! ```

pub mod error;
pub mod fetch;
pub mod render;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;
pub mod view;

pub use error::{FetchError, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use render::{RenderFn, default_render};
pub use renderlet_dom::{Content, Politeness, Wrapper, escape};
pub use view::{Callback, ErrorCallback, Phase, RefreshHandle, Renderlet, View};
