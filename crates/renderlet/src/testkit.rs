#![forbid(unsafe_code)]

//! Deterministic fetch doubles for exercising views without a network.
//!
//! Available to downstream crates behind the `test-helpers` feature and to
//! this crate's own suite unconditionally.
//!
//! - [`StaticFetcher`] resolves every invocation with one fixed value.
//! - [`FailFetcher`] rejects every invocation with one fixed message.
//! - [`GateFetcher`] parks each invocation until the test releases it, which
//!   makes races between overlapping invocations fully scriptable.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use serde_json::Value;
use web_time::Duration;

use crate::error::{FetchError, Result};
use crate::fetch::Fetch;

/// Shared invocation counters, cloneable out of a fetcher before it moves
/// into a view.
#[derive(Clone, Default)]
pub struct FetchCounters {
    calls: Arc<AtomicUsize>,
    refreshes: Arc<AtomicUsize>,
}

impl FetchCounters {
    /// Total invocations seen so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Invocations that carried the refresh flag.
    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn record(&self, refresh: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if refresh {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Resolves every invocation with a clone of one fixed value.
pub struct StaticFetcher {
    value: Value,
    counters: FetchCounters,
}

impl StaticFetcher {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            counters: FetchCounters::default(),
        }
    }

    /// Counter handle that stays readable after the fetcher moves into a
    /// view.
    #[must_use]
    pub fn counters(&self) -> FetchCounters {
        self.counters.clone()
    }
}

impl Fetch for StaticFetcher {
    fn fetch(&self, _src: &str, refresh: bool) -> Result<Value> {
        self.counters.record(refresh);
        Ok(self.value.clone())
    }
}

/// Rejects every invocation with one fixed message.
pub struct FailFetcher {
    message: String,
    counters: FetchCounters,
}

impl FailFetcher {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            counters: FetchCounters::default(),
        }
    }

    #[must_use]
    pub fn counters(&self) -> FetchCounters {
        self.counters.clone()
    }
}

impl Fetch for FailFetcher {
    fn fetch(&self, _src: &str, refresh: bool) -> Result<Value> {
        self.counters.record(refresh);
        Err(FetchError::other(self.message.clone()))
    }
}

/// Parks each invocation until the test resolves or rejects it.
///
/// Every invocation hands the controlling [`FetchGate`] a [`StartedFetch`]
/// carrying its own release channel, so a test can hold several invocations
/// open at once and complete them in any order it wants to exercise.
pub struct GateFetcher {
    starts: Mutex<Sender<StartedFetch>>,
    counters: FetchCounters,
}

/// Test-side controller for a [`GateFetcher`].
pub struct FetchGate {
    started_rx: Receiver<StartedFetch>,
}

/// One parked fetch invocation, waiting for the test to complete it.
pub struct StartedFetch {
    /// Source string the invocation was asked for.
    pub src: String,
    /// Whether the invocation carried the refresh flag.
    pub refresh: bool,
    release: Sender<Result<Value>>,
}

impl GateFetcher {
    /// A fetcher plus the gate controlling it.
    #[must_use]
    pub fn pair() -> (Self, FetchGate) {
        let (starts, started_rx) = mpsc::channel();
        (
            Self {
                starts: Mutex::new(starts),
                counters: FetchCounters::default(),
            },
            FetchGate { started_rx },
        )
    }

    #[must_use]
    pub fn counters(&self) -> FetchCounters {
        self.counters.clone()
    }
}

impl Fetch for GateFetcher {
    fn fetch(&self, src: &str, refresh: bool) -> Result<Value> {
        self.counters.record(refresh);
        let (release, outcome_rx) = mpsc::channel();
        let started = StartedFetch {
            src: src.to_string(),
            refresh,
            release,
        };
        let announced = self
            .starts
            .lock()
            .map(|starts| starts.send(started).is_ok())
            .unwrap_or(false);
        if !announced {
            return Err(FetchError::other("fetch gate closed"));
        }
        match outcome_rx.recv() {
            Ok(result) => result,
            Err(_) => Err(FetchError::other("fetch gate dropped without resolving")),
        }
    }
}

impl StartedFetch {
    /// Completes the invocation successfully.
    pub fn resolve(self, value: Value) {
        let _ = self.release.send(Ok(value));
    }

    /// Fails the invocation.
    pub fn reject(self, error: FetchError) {
        let _ = self.release.send(Err(error));
    }
}

impl FetchGate {
    /// Waits for the next invocation to start.
    ///
    /// # Panics
    ///
    /// Panics when no invocation starts within `timeout`; the gate is a
    /// test tool and a missing start is a failed expectation.
    #[must_use]
    pub fn started(&self, timeout: Duration) -> StartedFetch {
        self.started_rx
            .recv_timeout(timeout)
            .expect("no fetch invocation started within the timeout")
    }

    /// The next invocation, when one has already started.
    #[must_use]
    pub fn try_started(&self) -> Option<StartedFetch> {
        self.started_rx.try_recv().ok()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
