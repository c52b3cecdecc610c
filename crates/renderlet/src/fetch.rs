//! The fetch seam: how the component turns a source string into JSON.
//!
//! The component never talks to the network directly. It holds an
//! `Arc<dyn Fetch>` and calls it from a worker thread, once per fetch
//! invocation. [`HttpFetcher`] is the production implementation; tests and
//! embedders with their own transport supply closures or custom types.
//!
//! # Design
//!
//! - [`Fetch::fetch`] is synchronous and blocking. Concurrency lives in the
//!   component's worker threads, not in the fetcher.
//! - The `refresh` flag distinguishes a user-initiated re-fetch from the
//!   initial load so implementations can bypass caches for the former.
//! - Any `Fn(&str, bool) -> Result<Value>` that is `Send + Sync` is a
//!   fetcher, so ad-hoc sources need no wrapper type.

#![forbid(unsafe_code)]

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde_json::Value;
use web_time::Duration;

use crate::error::{FetchError, Result};

/// Produces the JSON value for a source string.
///
/// Implementations must be callable from any thread; the component invokes
/// them from short-lived workers.
pub trait Fetch: Send + Sync {
    /// Fetches `src` and returns its parsed JSON body.
    ///
    /// `refresh` is `true` when the invocation came from an imperative
    /// refresh rather than the initial mount or a source change.
    fn fetch(&self, src: &str, refresh: bool) -> Result<Value>;
}

impl<F> Fetch for F
where
    F: Fn(&str, bool) -> Result<Value> + Send + Sync,
{
    fn fetch(&self, src: &str, refresh: bool) -> Result<Value> {
        self(src, refresh)
    }
}

/// HTTP fetcher backed by a blocking [`reqwest`] client.
///
/// Expects a 2xx response whose body parses as JSON. Refresh invocations
/// send `Cache-Control: no-cache` (and the HTTP/1.0 `Pragma` equivalent) so
/// intermediaries revalidate instead of serving a stale body.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// A fetcher with no request timeout; slow sources stay in flight until
    /// they resolve or the connection drops.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .expect("failed to construct HTTP client");
        Self { client }
    }

    /// A fetcher that gives up on requests running longer than `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to construct HTTP client");
        Self { client }
    }

    /// Wraps a caller-configured client (proxies, TLS, default headers).
    #[must_use]
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, src: &str, refresh: bool) -> Result<Value> {
        let mut request = self.client.get(src);
        if refresh {
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::status(status.as_u16(), src));
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn closures_are_fetchers() {
        let fetcher = |src: &str, _refresh: bool| -> Result<Value> { Ok(json!({ "src": src })) };
        let value = fetcher.fetch("a.json", false).unwrap();
        assert_eq!(value, json!({ "src": "a.json" }));
    }

    #[test]
    fn closures_see_the_refresh_flag() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let fetcher = move |_src: &str, refresh: bool| -> Result<Value> {
            if refresh {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Value::Null)
        };

        fetcher.fetch("a.json", false).unwrap();
        fetcher.fetch("a.json", true).unwrap();
        fetcher.fetch("a.json", true).unwrap();
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fetchers_are_object_safe() {
        let fetcher: Arc<dyn Fetch> =
            Arc::new(|_: &str, _: bool| -> Result<Value> { Ok(json!(1)) });
        assert_eq!(fetcher.fetch("x", false).unwrap(), json!(1));
    }

    #[test]
    fn status_error_carries_code_and_source() {
        let err = FetchError::status(404, "missing.json");
        assert_eq!(err.to_string(), "unexpected status 404 from missing.json");
        assert!(err.is_transport());
    }

    #[test]
    fn body_error_is_not_transport() {
        let err: FetchError = serde_json::from_str::<Value>("not json")
            .unwrap_err()
            .into();
        assert!(!err.is_transport());
    }
}
