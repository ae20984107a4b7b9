//! Fire-and-forget socket dispatch.

use crate::error::Error;
use crate::options::{option, OptionValue, RequestOptions};
use crate::request::{HttpRequest, RequestOutcome};
use crate::socket::SocketDriver;

/// Dispatches a request over a raw socket without waiting for a response.
///
/// A dispatch counts as completed once the message is fully written. The
/// endpoint's acknowledgement, if any, is reported through the response
/// envelope handed to the callback options, never through the return
/// value.
///
/// ```ignore
/// use fanout_request::{option, FireAndForgetRequest, HttpRequest, OptionValue};
///
/// let mut request = FireAndForgetRequest::with_url("http://jobs.example.org/enqueue");
/// request.set_option(option::CONTENT, "task=reindex".into());
/// request.set_option(
///     option::ON_FAILED_CALLBACK,
///     OptionValue::callback(|envelope| eprintln!("{}", envelope.as_json())),
/// );
/// request.execute()?;
/// ```
pub struct FireAndForgetRequest {
    driver: SocketDriver,
}

impl FireAndForgetRequest {
    pub fn new() -> Self {
        Self {
            driver: SocketDriver::new(false),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let mut request = Self::new();
        request.driver.options.set(option::URL, url.into());
        request
    }
}

impl Default for FireAndForgetRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequest for FireAndForgetRequest {
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

    /// The acknowledgement line of the last dispatch, empty when none
    /// arrived. Socket dispatches record no named details.
    fn last_transfer_info(&self, _name: Option<&str>) -> Option<OptionValue> {
        Some(OptionValue::Str(self.driver.last_ack().to_string()))
    }

    fn options(&self) -> RequestOptions {
        self.driver.options.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::envelope::{field, ResponseEnvelope};
    use crate::socket::script;

    fn capture_envelope(
        request: &mut FireAndForgetRequest,
        channel: &str,
    ) -> Arc<Mutex<Option<ResponseEnvelope>>> {
        let seen = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        request.set_option(
            channel,
            OptionValue::callback(move |envelope| {
                *captured.lock().unwrap() = Some(envelope.clone());
            }),
        );
        seen
    }

    #[test]
    fn construction_seeds_dispatch_defaults() {
        let request = FireAndForgetRequest::new();
        let options = request.options();

        assert_eq!(options.get_i64(option::CONNECTION_TIMEOUT), Some(15));
        assert_eq!(options.get_i64(option::RETRY_COUNT), Some(2));
        assert_eq!(options.get_str(option::METHOD), Some("POST"));
        assert_eq!(
            options.get_str(option::CONTENT_TYPE),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(options.get_str(option::PROTOCOL_VERSION), Some("1.1"));
        assert_eq!(options.get_bool(option::SSL_VERIFY_PEER), Some(false));
        assert!(options.get_str(option::URL).is_none());
        assert!(options.get(option::FOLLOW_LOCATION).is_none());
    }

    #[test]
    fn with_url_seeds_the_url_option() {
        let request = FireAndForgetRequest::with_url("http://example.org/q");
        assert_eq!(
            request.options().get_str(option::URL),
            Some("http://example.org/q")
        );
    }

    #[test]
    fn ping_without_url_fails_closed() {
        let mut request = FireAndForgetRequest::new();
        assert!(!request.ping());
    }

    #[test]
    fn ping_probes_with_head() {
        let (addr, server) =
            script::one_shot_server("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string());
        let mut request = FireAndForgetRequest::with_url(format!("http://{addr}/inbox"));

        assert!(request.ping());

        let received = server.join().unwrap();
        let text = String::from_utf8_lossy(&received);
        assert!(text.starts_with("HEAD /inbox HTTP/1.1\r\n"));
        assert!(text.ends_with("Connection: Close\r\n\r\n"));
        assert!(!text.contains("Content-Length"));
    }

    #[test]
    fn acknowledged_dispatch_completes() {
        let (addr, server) =
            script::one_shot_server("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string());
        let mut request = FireAndForgetRequest::with_url(format!("http://{addr}/inbox"));
        request.set_option(option::CONTENT, "payload=1".into());
        let seen = capture_envelope(&mut request, option::ON_COMPLETED_CALLBACK);

        let outcome = request.execute().unwrap();
        assert!(outcome.completed());
        assert_eq!(request.last_error_code(), 0);

        let received = server.join().unwrap();
        let text = String::from_utf8_lossy(&received);
        assert!(text.starts_with("POST /inbox HTTP/1.1\r\n"));
        assert!(text.contains("Content-Length: 9\r\n"));
        assert!(text.ends_with("payload=1"));

        let envelope = seen.lock().unwrap().take().unwrap();
        assert_eq!(
            envelope.get(field::RESPONSE_MESSAGE).unwrap().as_str(),
            Some("HTTP/1.1 200 OK")
        );
        assert_eq!(envelope.get(field::WAS_COMPLETED).unwrap().as_bool(), Some(true));
        assert_eq!(
            envelope.get(field::CONNECTION_FAILURE).unwrap().as_i64(),
            Some(0)
        );
        // Acceptance tracking belongs to the redirect-aware flavor.
        assert!(!envelope.has(field::WAS_ACCEPTED));

        assert_eq!(
            request.last_transfer_info(None).and_then(|v| v.as_str().map(String::from)),
            Some("HTTP/1.1 200 OK".to_string())
        );
    }

    #[test]
    fn unreachable_host_reports_connection_failure() {
        let mut request = FireAndForgetRequest::with_url("http://127.0.0.1:1/queue");
        request.set_option(option::CONNECTION_TIMEOUT, OptionValue::Int(1));
        let seen = capture_envelope(&mut request, option::ON_FAILED_CALLBACK);

        let outcome = request.execute().unwrap();
        assert!(!outcome.completed());
        assert!(!request.last_error().is_empty());

        let envelope = seen.lock().unwrap().take().unwrap();
        assert_eq!(
            envelope.get(field::CONNECTION_FAILURE).unwrap().as_i64(),
            Some(-1)
        );
        assert_eq!(
            envelope.get(field::WAS_COMPLETED).unwrap().as_bool(),
            Some(false)
        );
        let message = envelope.get(field::RESPONSE_MESSAGE).unwrap();
        assert!(!message.as_str().unwrap().is_empty());
    }

    #[test]
    fn silent_endpoint_still_counts_as_dispatched() {
        let (addr, server) = script::silent_server();
        let mut request = FireAndForgetRequest::with_url(format!("http://{addr}/inbox"));
        request.set_option(option::CONNECTION_TIMEOUT, OptionValue::Int(1));
        let seen = capture_envelope(&mut request, option::ON_COMPLETED_CALLBACK);

        let outcome = request.execute().unwrap();
        assert!(outcome.completed());
        // The read timed out, so there is no acknowledgement but a
        // recorded error.
        assert!(!request.last_error().is_empty());

        let envelope = seen.lock().unwrap().take().unwrap();
        assert_eq!(envelope.get(field::RESPONSE_MESSAGE).unwrap().as_str(), Some(""));
        assert_eq!(envelope.get(field::WAS_COMPLETED).unwrap().as_bool(), Some(true));

        server.join().unwrap();
    }

    #[test]
    fn non_callback_value_under_callback_key_is_ignored() {
        let (addr, server) =
            script::one_shot_server("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string());
        let mut request = FireAndForgetRequest::with_url(format!("http://{addr}/inbox"));
        request.set_option(option::ON_COMPLETED_CALLBACK, "not a function".into());

        let outcome = request.execute().unwrap();
        assert!(outcome.completed());
        server.join().unwrap();
    }
}
