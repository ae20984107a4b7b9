//! Response caching as a request decorator.

use std::time::Duration;

use fanout_cache::Cache;

use crate::error::Error;
use crate::options::{option, OptionValue, RequestOptions};
use crate::request::{HttpRequest, RequestOutcome};
use crate::transfer::TransferOutcome;

const NAMESPACE: &str = "fanout:http:";
const DEFAULT_EXPIRY: Duration = Duration::from_secs(60);

/// Serves repeat transfers from a cache instead of re-dispatching.
///
/// Wraps any request. The cache key is derived from the wrapped request's
/// option set together with its effective target URL, so two decorators
/// configured alike share entries. Outcomes are stored only when the
/// wrapped request reported no failure.
///
/// ```ignore
/// use fanout_cache::InMemoryCache;
/// use fanout_request::{CachedRequest, HttpRequest, SingleRequest};
///
/// let mut request = CachedRequest::new(
///     Box::new(SingleRequest::with_url("http://api.example.org/rates")),
///     Box::new(InMemoryCache::new()),
/// );
///
/// request.execute()?; // dispatched
/// request.execute()?; // served from the cache
/// assert!(request.is_cached());
/// ```
pub struct CachedRequest {
    inner: Box<dyn HttpRequest>,
    cache: Box<dyn Cache<TransferOutcome>>,
    prefix: String,
    expiry: Duration,
    was_cached: bool,
}

impl CachedRequest {
    pub fn new(inner: Box<dyn HttpRequest>, cache: Box<dyn Cache<TransferOutcome>>) -> Self {
        Self {
            inner,
            cache,
            prefix: String::new(),
            expiry: DEFAULT_EXPIRY,
            was_cached: false,
        }
    }

    /// Prepend `prefix` to every derived cache key.
    pub fn set_cache_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// How long stored outcomes stay valid.
    pub fn set_expiry(&mut self, expiry: Duration) {
        self.expiry = expiry;
    }

    /// Whether the last `execute` was answered from the cache.
    pub fn is_cached(&self) -> bool {
        self.was_cached
    }

    /// Key = prefix + namespace + md5 over the serialized option snapshot,
    /// with the effective URL of the last transfer (when known) standing
    /// in for the configured one.
    fn cache_key(&self) -> String {
        let mut snapshot = self.inner.options();

        let effective = self
            .inner
            .last_transfer_info(Some("url"))
            .and_then(|v| v.as_str().map(String::from))
            .filter(|url| !url.is_empty());
        if let Some(url) = effective {
            snapshot.set(option::URL, url);
        }

        let serialized = serde_json::to_string(&snapshot).unwrap_or_default();
        format!("{}{}{:x}", self.prefix, NAMESPACE, md5::compute(serialized))
    }
}

impl HttpRequest for CachedRequest {
    fn ping(&mut self) -> bool {
        self.inner.ping()
    }

    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.inner.set_option(name, value);
    }

    fn get_option(&self, name: &str) -> Option<OptionValue> {
        self.inner.get_option(name)
    }

    fn execute(&mut self) -> Result<RequestOutcome, Error> {
        let key = self.cache_key();

        if let Some(outcome) = self.cache.fetch(&key) {
            tracing::debug!(key = %key, "serving cached transfer");
            self.was_cached = true;
            return Ok(RequestOutcome::Transfer(outcome));
        }

        self.was_cached = false;
        let outcome = self.inner.execute()?;

        if let RequestOutcome::Transfer(transfer) = &outcome {
            if self.inner.last_error_code() == 0 {
                self.cache.save(&key, transfer.clone(), self.expiry);
            }
        }

        Ok(outcome)
    }

    fn last_error(&self) -> String {
        self.inner.last_error()
    }

    fn last_error_code(&self) -> i32 {
        self.inner.last_error_code()
    }

    fn last_transfer_info(&self, name: Option<&str>) -> Option<OptionValue> {
        self.inner.last_transfer_info(name)
    }

    fn options(&self) -> RequestOptions {
        self.inner.options()
    }
}
