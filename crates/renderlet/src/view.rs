#![forbid(unsafe_code)]

//! The component: a builder, a mounted [`View`], and a [`RefreshHandle`].
//!
//! A [`Renderlet`] describes what to fetch and how to render it. Mounting it
//! produces a [`View`] that owns a retained [`Wrapper`] for its whole
//! lifetime, plus a cloneable [`RefreshHandle`] for imperative re-fetches.
//! Every fetch invocation runs on its own short-lived worker thread; the
//! worker reports back over a channel and the owner thread folds outcomes in
//! during [`View::tick`] / [`View::tick_deadline`].
//!
//! # Race Policy
//!
//! The view keeps one **sequence counter** covering every way a fetch can
//! start: mount, source change, refresh. Starting a fetch bumps the counter
//! and stamps the invocation; an outcome is applied only while its stamp
//! still equals the counter. The latest started invocation therefore always
//! wins, regardless of arrival order, and a superseded invocation is
//! discarded without running any callback.
//!
//! # Callback Discipline
//!
//! Callbacks never run while the view's internal state is borrowed, so a
//! callback may freely call back into the view (for example, an `on_ready`
//! handler triggering another refresh). Callbacks run on the owner thread
//! only, during mount/unmount, `set_src`, `refresh`, and the tick calls.
//!
//! # Readiness
//!
//! After a mount-path fetch applies, `on_ready` waits until the wrapper
//! actually holds an element child; plain text content never satisfies the
//! gate. A successful refresh reports `on_ready` immediately: its content
//! replaces content that was already live.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use renderlet_dom::{Content, Politeness, Wrapper};
use serde_json::Value;
use web_time::Duration;
#[cfg(feature = "tracing")]
use web_time::Instant;

use crate::error::{FetchError, Result};
use crate::fetch::{Fetch, HttpFetcher};
use crate::render::{RenderFn, default_render};

/// Callback invoked on a lifecycle edge.
pub type Callback = Rc<dyn Fn()>;

/// Callback invoked when a fetch invocation fails.
pub type ErrorCallback = Rc<dyn Fn(&FetchError)>;

/// Where the view's fetch pipeline currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight and no data displayed.
    Idle,
    /// The latest started fetch has not resolved yet.
    Loading,
    /// Data is displayed and nothing newer is in flight.
    Ready,
}

#[derive(Clone, Default)]
struct Callbacks {
    on_attach: Option<Callback>,
    on_detach: Option<Callback>,
    on_loading: Option<Callback>,
    on_ready: Option<Callback>,
    on_refresh: Option<Callback>,
    on_error: Option<ErrorCallback>,
}

/// What a fetch worker reports back to the owner thread.
struct Envelope {
    seq: u64,
    refresh: bool,
    result: Result<Value>,
}

/// A fetch invocation ready to be handed to a worker thread.
struct Job {
    fetcher: Arc<dyn Fetch>,
    src: String,
    refresh: bool,
    seq: u64,
    tx: Sender<Envelope>,
}

/// Work to perform after the state borrow is released: user callbacks in
/// their observable order, interleaved with worker spawns.
enum Effect {
    Attach,
    Detach,
    Loading,
    Refresh,
    Ready,
    Error(FetchError),
    Spawn(Job),
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Builder for a fetch-and-render view.
///
/// All configuration is fixed at mount time except the source string, which
/// [`View::set_src`] can change later.
pub struct Renderlet {
    src: String,
    fetcher: Option<Arc<dyn Fetch>>,
    render: RenderFn,
    tag: String,
    politeness: Politeness,
    attrs: Vec<(String, String)>,
    callbacks: Callbacks,
}

impl Renderlet {
    /// A view description with an empty source, the default JSON-text
    /// render, a polite `<div>` wrapper, and the HTTP fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            src: String::new(),
            fetcher: None,
            render: Rc::new(default_render),
            tag: "div".to_string(),
            politeness: Politeness::default(),
            attrs: Vec::new(),
            callbacks: Callbacks::default(),
        }
    }

    /// Sets the source to fetch. An empty source mounts inert.
    #[must_use]
    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    /// Replaces the fetch implementation.
    #[must_use]
    pub fn fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Replaces the fetch implementation with a closure.
    ///
    /// Equivalent to [`Renderlet::fetcher`], but the direct `Fn` bound lets
    /// closure arguments infer without annotations.
    #[must_use]
    pub fn fetch_with<F>(mut self, fetch: F) -> Self
    where
        F: Fn(&str, bool) -> Result<Value> + Send + Sync + 'static,
    {
        self.fetcher = Some(Arc::new(fetch));
        self
    }

    /// Replaces the render function.
    #[must_use]
    pub fn render_with<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value) -> Content + 'static,
    {
        self.render = Rc::new(render);
        self
    }

    /// Sets the wrapper's tag name.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Sets how assistive technology announces content swaps.
    #[must_use]
    pub fn politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }

    /// Adds a pass-through attribute to the wrapper.
    ///
    /// `aria-live` cannot be set this way; use [`Renderlet::politeness`].
    /// Invalid attribute names are dropped at mount.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Called once when the view mounts.
    #[must_use]
    pub fn on_attach(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_attach = Some(Rc::new(f));
        self
    }

    /// Called once when the view unmounts.
    #[must_use]
    pub fn on_detach(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_detach = Some(Rc::new(f));
        self
    }

    /// Called when a mount-path fetch starts (mount or source change).
    #[must_use]
    pub fn on_loading(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_loading = Some(Rc::new(f));
        self
    }

    /// Called when fetched content is ready; see the module docs for the
    /// element-child gate on the mount path.
    #[must_use]
    pub fn on_ready(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_ready = Some(Rc::new(f));
        self
    }

    /// Called synchronously when an imperative refresh is requested.
    #[must_use]
    pub fn on_refresh(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_refresh = Some(Rc::new(f));
        self
    }

    /// Called when the currently relevant fetch invocation fails.
    /// Superseded invocations never reach this callback.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&FetchError) + 'static) -> Self {
        self.callbacks.on_error = Some(Rc::new(f));
        self
    }

    /// Mounts the view: builds the wrapper, fires `on_attach`, and starts
    /// the initial fetch when the source is non-empty.
    #[must_use]
    pub fn mount(self) -> (View, RefreshHandle) {
        let Renderlet {
            src,
            fetcher,
            render,
            tag,
            politeness,
            attrs,
            callbacks,
        } = self;
        let fetcher = fetcher.unwrap_or_else(|| Arc::new(HttpFetcher::new()));

        let mut wrapper = Wrapper::with_tag(tag);
        wrapper.set_aria_live(politeness);
        for (name, value) in attrs {
            if !wrapper.push_attr(name.as_str(), value) {
                #[cfg(feature = "tracing")]
                tracing::warn!(message = "wrapper.attr_rejected", name = %name);
            }
        }

        let (outcome_tx, outcome_rx) = mpsc::channel();
        let inner = Rc::new(RefCell::new(Inner {
            src,
            fetcher,
            render,
            wrapper,
            data: None,
            phase: Phase::Idle,
            seq: 0,
            ready_armed: false,
            detached: false,
            callbacks,
            outcome_tx,
            outcome_rx,
        }));
        let handle = RefreshHandle {
            inner: Rc::downgrade(&inner),
        };
        let effects = inner.borrow_mut().attach();
        let view = View { inner };
        run_effects(&view.inner, effects);
        (view, handle)
    }
}

impl Default for Renderlet {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Mounted view ────────────────────────────────────────────────────────────

/// A mounted fetch-and-render view.
///
/// Single-threaded by design: the view lives on its owner thread, and all
/// callbacks run there. Dropping the view unmounts it.
pub struct View {
    inner: Rc<RefCell<Inner>>,
}

impl View {
    /// Applies any fetch outcomes that have already arrived, without
    /// blocking. Returns `true` when content changed.
    pub fn tick(&self) -> bool {
        let (changed, effects) = self.inner.borrow_mut().drain(None);
        run_effects(&self.inner, effects);
        changed
    }

    /// Waits up to `timeout` for one fetch outcome to arrive, then applies
    /// everything pending. Returns `true` when content changed.
    ///
    /// Returns as soon as an outcome arrives, including a superseded one
    /// that applies nothing.
    pub fn tick_deadline(&self, timeout: Duration) -> bool {
        let (changed, effects) = self.inner.borrow_mut().drain(Some(timeout));
        run_effects(&self.inner, effects);
        changed
    }

    /// Changes the source and starts a fetch for it.
    ///
    /// Setting the current source again is a no-op. Setting an empty source
    /// supersedes any in-flight fetch and keeps displayed content as is.
    pub fn set_src(&self, src: impl Into<String>) {
        let effects = self.inner.borrow_mut().change_src(src.into());
        run_effects(&self.inner, effects);
    }

    /// The current source string.
    #[must_use]
    pub fn src(&self) -> String {
        self.inner.borrow().src.clone()
    }

    /// Where the fetch pipeline currently stands.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase
    }

    /// The most recently applied value, if any fetch has succeeded.
    #[must_use]
    pub fn data(&self) -> Option<Value> {
        self.inner.borrow().data.clone()
    }

    /// Serializes the wrapper and its current content.
    #[must_use]
    pub fn html(&self) -> String {
        self.inner.borrow().wrapper.to_html()
    }

    /// Reads the wrapper structurally without serializing.
    ///
    /// The closure sees a snapshot taken before it runs, so like the
    /// lifecycle callbacks it may call back into the view.
    pub fn with_wrapper<R>(&self, f: impl FnOnce(&Wrapper) -> R) -> R {
        let wrapper = self.inner.borrow().wrapper.clone();
        f(&wrapper)
    }

    /// Unmounts the view: supersedes any in-flight fetch and fires
    /// `on_detach`. Dropping the view does the same.
    pub fn unmount(self) {
        self.release();
    }

    fn release(&self) {
        let effects = self.inner.borrow_mut().detach();
        run_effects(&self.inner, effects);
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.release();
    }
}

/// Imperative handle for re-fetching the current source.
///
/// Cloneable and inert once the view unmounts, so it can be stored by code
/// that outlives the view.
#[derive(Clone)]
pub struct RefreshHandle {
    inner: Weak<RefCell<Inner>>,
}

impl RefreshHandle {
    /// Fires `on_refresh`, then re-fetches the current source with the
    /// refresh flag set. Inert when the view is gone or the source is
    /// empty.
    pub fn refresh(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let effects = inner.borrow_mut().request_refresh();
        run_effects(&inner, effects);
    }

    /// Whether the view behind this handle is still mounted.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| !inner.borrow().detached)
    }
}

// ─── State machine ───────────────────────────────────────────────────────────

struct Inner {
    src: String,
    fetcher: Arc<dyn Fetch>,
    render: RenderFn,
    wrapper: Wrapper,
    data: Option<Value>,
    phase: Phase,
    /// Stamp of the latest started fetch invocation. Bumped by every mount,
    /// source change, refresh, and detach, so older outcomes can never pass
    /// the relevance check in [`Inner::apply`].
    seq: u64,
    /// A mount-path fetch applied and `on_ready` is owed once the wrapper
    /// holds an element child.
    ready_armed: bool,
    detached: bool,
    callbacks: Callbacks,
    outcome_tx: Sender<Envelope>,
    outcome_rx: Receiver<Envelope>,
}

impl Inner {
    fn attach(&mut self) -> Vec<Effect> {
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "view.attach", src = %self.src);
        let mut effects = vec![Effect::Attach];
        if !self.src.is_empty() {
            effects.extend(self.begin_fetch(false));
        }
        effects
    }

    fn detach(&mut self) -> Vec<Effect> {
        if self.detached {
            return Vec::new();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "view.detach", seq = self.seq);
        self.detached = true;
        self.seq += 1;
        self.ready_armed = false;
        vec![Effect::Detach]
    }

    fn change_src(&mut self, src: String) -> Vec<Effect> {
        if self.detached || src == self.src {
            return Vec::new();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "view.set_src", from = %self.src, to = %src);
        self.src = src;
        if self.src.is_empty() {
            // Supersede whatever is in flight; keep displayed content.
            self.seq += 1;
            self.phase = if self.data.is_some() {
                Phase::Ready
            } else {
                Phase::Idle
            };
            return Vec::new();
        }
        self.begin_fetch(false)
    }

    fn request_refresh(&mut self) -> Vec<Effect> {
        if self.detached || self.src.is_empty() {
            return Vec::new();
        }
        self.begin_fetch(true)
    }

    /// Stamps a new fetch invocation and returns its announcement callback
    /// followed by the worker spawn, in that order.
    fn begin_fetch(&mut self, refresh: bool) -> Vec<Effect> {
        self.seq += 1;
        self.phase = Phase::Loading;
        let announce = if refresh {
            Effect::Refresh
        } else {
            Effect::Loading
        };
        vec![
            announce,
            Effect::Spawn(Job {
                fetcher: Arc::clone(&self.fetcher),
                src: self.src.clone(),
                refresh,
                seq: self.seq,
                tx: self.outcome_tx.clone(),
            }),
        ]
    }

    /// Pulls pending envelopes (optionally waiting for the first one),
    /// applies the relevant ones, and re-checks the readiness gate.
    fn drain(&mut self, wait: Option<Duration>) -> (bool, Vec<Effect>) {
        let mut pending = Vec::new();
        if let Some(timeout) = wait
            && let Ok(envelope) = self.outcome_rx.recv_timeout(timeout)
        {
            pending.push(envelope);
        }
        while let Ok(envelope) = self.outcome_rx.try_recv() {
            pending.push(envelope);
        }

        let mut changed = false;
        let mut effects = Vec::new();
        for envelope in pending {
            let (applied, more) = self.apply(envelope);
            changed |= applied;
            effects.extend(more);
        }
        if self.ready_armed && self.wrapper.has_element_child() {
            self.ready_armed = false;
            effects.push(Effect::Ready);
        }
        (changed, effects)
    }

    /// Folds one fetch outcome into the view. Outcomes whose stamp no
    /// longer matches are discarded without side effects.
    fn apply(&mut self, envelope: Envelope) -> (bool, Vec<Effect>) {
        let Envelope {
            seq,
            refresh,
            result,
        } = envelope;
        if self.detached || seq != self.seq {
            #[cfg(feature = "tracing")]
            tracing::trace!(message = "fetch.stale", seq, current = self.seq);
            return (false, Vec::new());
        }
        match result {
            Ok(value) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(message = "fetch.apply", seq, refresh);
                let content = (self.render)(&value);
                self.data = Some(value);
                self.wrapper.set_content(Some(content));
                self.phase = Phase::Ready;
                if refresh {
                    // Refresh replaces content that was already live; no
                    // element-child gate applies.
                    self.ready_armed = false;
                    (true, vec![Effect::Ready])
                } else {
                    self.ready_armed = true;
                    (true, Vec::new())
                }
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(message = "fetch.fail", seq, refresh, error = %error);
                self.phase = if self.data.is_some() {
                    Phase::Ready
                } else {
                    Phase::Idle
                };
                (false, vec![Effect::Error(error)])
            }
        }
    }
}

// ─── Effects ─────────────────────────────────────────────────────────────────

/// Runs effects with no state borrow held, so callbacks can re-enter the
/// view.
fn run_effects(inner: &Rc<RefCell<Inner>>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Attach => fire(inner, |c| c.on_attach.clone()),
            Effect::Detach => fire(inner, |c| c.on_detach.clone()),
            Effect::Loading => fire(inner, |c| c.on_loading.clone()),
            Effect::Refresh => fire(inner, |c| c.on_refresh.clone()),
            Effect::Ready => fire(inner, |c| c.on_ready.clone()),
            Effect::Error(error) => {
                let callback = inner.borrow().callbacks.on_error.clone();
                if let Some(callback) = callback {
                    callback(&error);
                }
            }
            Effect::Spawn(job) => spawn_fetch(job),
        }
    }
}

fn fire(inner: &Rc<RefCell<Inner>>, select: impl Fn(&Callbacks) -> Option<Callback>) {
    let callback = select(&inner.borrow().callbacks);
    if let Some(callback) = callback {
        callback();
    }
}

fn spawn_fetch(job: Job) {
    let Job {
        fetcher,
        src,
        refresh,
        seq,
        tx,
    } = job;
    #[cfg(feature = "tracing")]
    tracing::debug!(message = "fetch.start", seq, refresh, src = %src);
    thread::Builder::new()
        .name(format!("renderlet-fetch-{seq}"))
        .spawn(move || {
            #[cfg(feature = "tracing")]
            let started = Instant::now();
            // A panicking fetcher reports as a failed invocation, the same
            // way a rejected fetch does.
            let result = catch_unwind(AssertUnwindSafe(|| fetcher.fetch(&src, refresh)))
                .unwrap_or_else(|_| Err(FetchError::other("fetch implementation panicked")));
            #[cfg(feature = "tracing")]
            tracing::debug!(
                message = "fetch.done",
                seq,
                ok = result.is_ok(),
                elapsed_ms = started.elapsed().as_millis() as u64
            );
            // The owner may already be gone; an envelope with no audience
            // is dropped here.
            let _ = tx.send(Envelope {
                seq,
                refresh,
                result,
            });
        })
        .expect("failed to spawn fetch worker");
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use renderlet_dom::Content;
    use serde_json::json;

    use crate::testkit::{FailFetcher, StaticFetcher};

    use super::*;

    const TICK: Duration = Duration::from_secs(5);

    fn settle(view: &View) {
        while view.phase() == Phase::Loading {
            view.tick_deadline(TICK);
        }
    }

    #[test]
    fn mount_with_empty_src_is_idle() {
        let fetcher = StaticFetcher::new(json!(1));
        let counters = fetcher.counters();
        let loading = Rc::new(Cell::new(0u32));
        let loading_seen = Rc::clone(&loading);

        let (view, _handle) = Renderlet::new()
            .fetcher(fetcher)
            .on_loading(move || loading_seen.set(loading_seen.get() + 1))
            .mount();

        assert_eq!(view.phase(), Phase::Idle);
        assert!(!view.tick());
        assert_eq!(counters.calls(), 0);
        assert_eq!(loading.get(), 0);
        assert_eq!(view.html(), r#"<div aria-live="polite"></div>"#);
    }

    #[test]
    fn mount_fetches_and_applies() {
        let fetcher = StaticFetcher::new(json!({ "checked": true }));
        let counters = fetcher.counters();

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(fetcher)
            .mount();

        assert_eq!(view.phase(), Phase::Loading);
        settle(&view);

        assert_eq!(view.phase(), Phase::Ready);
        assert_eq!(view.data(), Some(json!({ "checked": true })));
        assert!(view.html().contains("checked"));
        assert_eq!(counters.calls(), 1);
        assert_eq!(counters.refreshes(), 0);
    }

    #[test]
    fn attach_fires_before_loading() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let attach_order = Rc::clone(&order);
        let loading_order = Rc::clone(&order);

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(StaticFetcher::new(json!(null)))
            .on_attach(move || attach_order.borrow_mut().push("attach"))
            .on_loading(move || loading_order.borrow_mut().push("loading"))
            .mount();

        assert_eq!(*order.borrow(), ["attach", "loading"]);
        settle(&view);
    }

    #[test]
    fn ready_waits_for_element_child() {
        let ready = Rc::new(Cell::new(0u32));
        let ready_seen = Rc::clone(&ready);

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(StaticFetcher::new(json!("plain")))
            .on_ready(move || ready_seen.set(ready_seen.get() + 1))
            .mount();
        settle(&view);

        // Text content never satisfies the gate.
        assert_eq!(view.phase(), Phase::Ready);
        assert!(!view.tick());
        assert_eq!(ready.get(), 0);
    }

    #[test]
    fn ready_fires_once_for_markup() {
        let ready = Rc::new(Cell::new(0u32));
        let ready_seen = Rc::clone(&ready);

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(StaticFetcher::new(json!("x")))
            .render_with(|_| Content::Markup("<p>x</p>".into()))
            .on_ready(move || ready_seen.set(ready_seen.get() + 1))
            .mount();
        settle(&view);

        assert_eq!(ready.get(), 1);
        assert!(!view.tick());
        assert_eq!(ready.get(), 1);
    }

    #[test]
    fn refresh_refetches_with_flag() {
        let fetcher = StaticFetcher::new(json!(7));
        let counters = fetcher.counters();
        let refreshed = Rc::new(Cell::new(0u32));
        let refreshed_seen = Rc::clone(&refreshed);

        let (view, handle) = Renderlet::new()
            .src("data.json")
            .fetcher(fetcher)
            .on_refresh(move || refreshed_seen.set(refreshed_seen.get() + 1))
            .mount();
        settle(&view);

        handle.refresh();
        // on_refresh is synchronous with the request, before resolution.
        assert_eq!(refreshed.get(), 1);
        settle(&view);

        assert_eq!(counters.calls(), 2);
        assert_eq!(counters.refreshes(), 1);
    }

    #[test]
    fn refresh_success_reports_ready_without_gate() {
        let ready = Rc::new(Cell::new(0u32));
        let ready_seen = Rc::clone(&ready);

        let (view, handle) = Renderlet::new()
            .src("data.json")
            .fetcher(StaticFetcher::new(json!("text")))
            .on_ready(move || ready_seen.set(ready_seen.get() + 1))
            .mount();
        settle(&view);
        assert_eq!(ready.get(), 0);

        handle.refresh();
        settle(&view);
        // Text content, but refresh readiness does not wait for elements.
        assert_eq!(ready.get(), 1);
    }

    #[test]
    fn set_src_same_value_is_noop() {
        let fetcher = StaticFetcher::new(json!(1));
        let counters = fetcher.counters();

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(fetcher)
            .mount();
        settle(&view);

        view.set_src("data.json");
        assert_eq!(view.phase(), Phase::Ready);
        assert_eq!(counters.calls(), 1);
    }

    #[test]
    fn set_src_starts_new_fetch() {
        let fetcher = StaticFetcher::new(json!(1));
        let counters = fetcher.counters();
        let loading = Rc::new(Cell::new(0u32));
        let loading_seen = Rc::clone(&loading);

        let (view, _handle) = Renderlet::new()
            .src("a.json")
            .fetcher(fetcher)
            .on_loading(move || loading_seen.set(loading_seen.get() + 1))
            .mount();
        settle(&view);

        view.set_src("b.json");
        assert_eq!(view.phase(), Phase::Loading);
        settle(&view);

        assert_eq!(counters.calls(), 2);
        assert_eq!(loading.get(), 2);
        assert_eq!(view.src(), "b.json");
    }

    #[test]
    fn set_src_empty_keeps_displayed_data() {
        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(StaticFetcher::new(json!("kept")))
            .mount();
        settle(&view);
        let html = view.html();

        view.set_src("");
        assert_eq!(view.phase(), Phase::Ready);
        assert_eq!(view.html(), html);
        assert_eq!(view.data(), Some(json!("kept")));
    }

    #[test]
    fn refresh_with_empty_src_is_inert() {
        let fetcher = StaticFetcher::new(json!(1));
        let counters = fetcher.counters();
        let refreshed = Rc::new(Cell::new(0u32));
        let refreshed_seen = Rc::clone(&refreshed);

        let (view, handle) = Renderlet::new()
            .fetcher(fetcher)
            .on_refresh(move || refreshed_seen.set(refreshed_seen.get() + 1))
            .mount();

        handle.refresh();
        assert!(!view.tick());
        assert_eq!(counters.calls(), 0);
        assert_eq!(refreshed.get(), 0);
    }

    #[test]
    fn failure_with_no_data_reports_error_and_goes_idle() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let errors_seen = Rc::clone(&errors);

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(FailFetcher::new("backend down"))
            .on_error(move |e| errors_seen.borrow_mut().push(e.to_string()))
            .mount();
        settle(&view);

        assert_eq!(view.phase(), Phase::Idle);
        assert_eq!(view.data(), None);
        assert_eq!(*errors.borrow(), ["backend down"]);
    }

    #[test]
    fn panicking_fetcher_reports_error() {
        let errors = Rc::new(Cell::new(0u32));
        let errors_seen = Rc::clone(&errors);

        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetch_with(|_, _| panic!("boom"))
            .on_error(move |_| errors_seen.set(errors_seen.get() + 1))
            .mount();
        settle(&view);

        assert_eq!(view.phase(), Phase::Idle);
        assert_eq!(errors.get(), 1);
    }

    #[test]
    fn handle_is_inert_after_unmount() {
        let fetcher = StaticFetcher::new(json!(1));
        let counters = fetcher.counters();

        let (view, handle) = Renderlet::new()
            .src("data.json")
            .fetcher(fetcher)
            .mount();
        settle(&view);
        assert!(handle.is_attached());

        view.unmount();
        assert!(!handle.is_attached());
        handle.refresh();
        assert_eq!(counters.calls(), 1);
    }

    #[test]
    fn detach_fires_once_even_with_explicit_unmount() {
        let detached = Rc::new(Cell::new(0u32));
        let detached_seen = Rc::clone(&detached);

        let (view, _handle) = Renderlet::new()
            .on_detach(move || detached_seen.set(detached_seen.get() + 1))
            .mount();
        view.unmount();
        assert_eq!(detached.get(), 1);
    }

    #[test]
    fn drop_unmounts() {
        let detached = Rc::new(Cell::new(0u32));
        let detached_seen = Rc::clone(&detached);

        let (view, handle) = Renderlet::new()
            .on_detach(move || detached_seen.set(detached_seen.get() + 1))
            .mount();
        drop(view);
        assert_eq!(detached.get(), 1);
        assert!(!handle.is_attached());
    }

    #[test]
    fn callbacks_may_reenter_the_view() {
        let fetcher = StaticFetcher::new(json!("x"));
        let counters = fetcher.counters();
        let ready = Rc::new(Cell::new(0u32));
        let ready_seen = Rc::clone(&ready);
        let slot: Rc<RefCell<Option<RefreshHandle>>> = Rc::new(RefCell::new(None));
        let slot_in_callback = Rc::clone(&slot);

        let (view, handle) = Renderlet::new()
            .src("data.json")
            .fetcher(fetcher)
            .render_with(|_| Content::Markup("<p>x</p>".into()))
            .on_ready(move || {
                let count = ready_seen.get() + 1;
                ready_seen.set(count);
                // Re-enter once from inside the callback.
                if count == 1 {
                    let handle = slot_in_callback.borrow().clone();
                    if let Some(handle) = handle {
                        handle.refresh();
                    }
                }
            })
            .mount();
        *slot.borrow_mut() = Some(handle.clone());
        settle(&view);
        settle(&view);

        assert_eq!(counters.calls(), 2);
        assert_eq!(ready.get(), 2);
    }

    #[test]
    fn with_wrapper_closure_may_reenter_the_view() {
        let (view, _handle) = Renderlet::new()
            .src("data.json")
            .fetcher(StaticFetcher::new(json!("x")))
            .mount();
        settle(&view);

        let (html, phase) = view.with_wrapper(|w| (w.to_html(), view.phase()));
        assert_eq!(html, view.html());
        assert_eq!(phase, Phase::Ready);
    }
}
