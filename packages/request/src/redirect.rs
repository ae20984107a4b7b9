//! Redirect-aware socket dispatch.

use crate::error::Error;
use crate::options::{option, OptionValue, RequestOptions};
use crate::request::{HttpRequest, RequestOutcome};
use crate::socket::SocketDriver;

/// Fire-and-forget dispatch that chases one redirect hop and tracks
/// endpoint acceptance.
///
/// [`ping`](HttpRequest::ping) reads the probe response: a `301` answer
/// rewrites the URL option to its `Location` target, and envelopes from
/// later dispatches report that under `followed_location`. Dispatch
/// acknowledgements are checked for `202 Accepted`; anything else routes
/// the envelope to the failure callback even when the write completed.
pub struct RedirectAwareRequest {
    driver: SocketDriver,
}

impl RedirectAwareRequest {
    pub fn new() -> Self {
        Self {
            driver: SocketDriver::new(true),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let mut request = Self::new();
        request.driver.options.set(option::URL, url.into());
        request
    }

    /// The URL dispatches currently target, after any followed redirect.
    pub fn effective_url(&self) -> Option<String> {
        self.driver.options.get_str(option::URL).map(str::to_string)
    }

    /// Whether a probe rewrote the target URL.
    pub fn followed_location(&self) -> bool {
        self.driver.followed_location()
    }
}

impl Default for RedirectAwareRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequest for RedirectAwareRequest {
    fn ping(&mut self) -> bool {
        self.driver.ping()
    }

    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.driver.options.set(name, value);
    }

    fn get_option(&self, name: &str) -> Option<OptionValue> {
        self.driver.options.get(name).cloned()
    }

    fn execute(&mut self) -> Result<RequestOutcome, Error> {
        Ok(RequestOutcome::Completed(self.driver.execute()))
    }

    fn last_error(&self) -> String {
        self.driver.last_error()
    }

    fn last_error_code(&self) -> i32 {
        self.driver.last_error_code()
    }

    fn last_transfer_info(&self, _name: Option<&str>) -> Option<OptionValue> {
        Some(OptionValue::Str(self.driver.last_ack().to_string()))
    }

    fn options(&self) -> RequestOptions {
        self.driver.options.clone()
    }
}
