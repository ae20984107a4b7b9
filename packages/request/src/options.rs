//! Request option names and the typed bag they live in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::envelope::ResponseEnvelope;

/// Well-known option names.
///
/// Options are an open set: unknown names are carried verbatim and ignored
/// by dispatchers that have no use for them.
pub mod option {
    /// Target URL for the request.
    pub const URL: &str = "url";
    /// Connection timeout in seconds (integer or float).
    pub const CONNECTION_TIMEOUT: &str = "connection-timeout";
    /// Number of write attempts before giving up.
    pub const RETRY_COUNT: &str = "retry-count";
    /// HTTP method, e.g. `POST`.
    pub const METHOD: &str = "method";
    /// Value for the `Content-Type` header.
    pub const CONTENT_TYPE: &str = "content-type";
    /// Request body payload.
    pub const CONTENT: &str = "content";
    /// Bitmask of [`socket_flags`](super::socket_flags) values.
    pub const SOCKET_CLIENT_FLAGS: &str = "socket-client-flags";
    /// Verify the peer certificate on TLS connections.
    pub const SSL_VERIFY_PEER: &str = "ssl-verify-peer";
    /// Follow a redirect response to its `Location` target.
    pub const FOLLOW_LOCATION: &str = "follow-location";
    /// HTTP protocol version token, e.g. `1.1`.
    pub const PROTOCOL_VERSION: &str = "protocol-version";
    /// Callback invoked when a dispatch completes and is accepted.
    pub const ON_COMPLETED_CALLBACK: &str = "on-completed-callback";
    /// Callback invoked when a dispatch fails or is refused.
    pub const ON_FAILED_CALLBACK: &str = "on-failed-callback";
    /// Buffer the response body into the transfer outcome.
    pub const BUFFER_RESPONSE: &str = "buffer-response";
    /// Cap on concurrently running transfers in a multiplexed batch.
    pub const MAX_ACTIVE_TRANSFERS: &str = "max-active-transfers";
}

/// Flags accepted under [`option::SOCKET_CLIENT_FLAGS`].
///
/// `ASYNC_CONNECT` is advisory: connections are opened with a timeout
/// either way, the flag only records the caller's intent.
pub mod socket_flags {
    pub const CONNECT: i64 = 0b01;
    pub const ASYNC_CONNECT: i64 = 0b10;
}

/// Callback invoked with the response envelope of a socket dispatch.
pub type EnvelopeCallback = Arc<dyn Fn(&ResponseEnvelope) + Send + Sync>;

/// A single option value.
///
/// Callbacks are opaque: they clone by reference, compare by identity and
/// serialize as the placeholder `<callback>`.
#[derive(Clone)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Callback(EnvelopeCallback),
}

impl OptionValue {
    /// Wrap a closure as a callback value.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&ResponseEnvelope) + Send + Sync + 'static,
    {
        OptionValue::Callback(Arc::new(f))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret the value as a duration in seconds.
    ///
    /// Negative and non-finite values yield `None` so callers fall back
    /// to their defaults.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            OptionValue::Int(secs) if *secs >= 0 => Some(Duration::from_secs(*secs as u64)),
            OptionValue::Float(secs) => Duration::try_from_secs_f64(*secs).ok(),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&EnvelopeCallback> {
        match self {
            OptionValue::Callback(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            OptionValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            OptionValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            OptionValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            OptionValue::Callback(_) => f.write_str("Callback(<callback>)"),
        }
    }
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OptionValue::Str(a), OptionValue::Str(b)) => a == b,
            (OptionValue::Int(a), OptionValue::Int(b)) => a == b,
            (OptionValue::Float(a), OptionValue::Float(b)) => a == b,
            (OptionValue::Bool(a), OptionValue::Bool(b)) => a == b,
            (OptionValue::Callback(a), OptionValue::Callback(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionValue::Str(s) => serializer.serialize_str(s),
            OptionValue::Int(i) => serializer.serialize_i64(*i),
            OptionValue::Float(x) => serializer.serialize_f64(*x),
            OptionValue::Bool(b) => serializer.serialize_bool(*b),
            OptionValue::Callback(_) => serializer.serialize_str("<callback>"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

/// An ordered bag of named option values.
///
/// Serializes with keys in sorted order, which keeps derived cache keys
/// stable across insertion orders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    values: BTreeMap<String, OptionValue>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(OptionValue::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    pub fn get_duration(&self, name: &str) -> Option<Duration> {
        self.get(name).and_then(OptionValue::as_duration)
    }

    /// Fetch a callback option. Non-callback values under the name are
    /// treated as unset.
    pub fn get_callback(&self, name: &str) -> Option<&EnvelopeCallback> {
        self.get(name).and_then(OptionValue::as_callback)
    }
}

impl Serialize for RequestOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut options = RequestOptions::new();
        options.set(option::URL, "http://example.org/job");
        options.set(option::RETRY_COUNT, 3_i64);
        options.set(option::CONNECTION_TIMEOUT, 2.5_f64);
        options.set(option::SSL_VERIFY_PEER, true);

        assert_eq!(options.get_str(option::URL), Some("http://example.org/job"));
        assert_eq!(options.get_i64(option::RETRY_COUNT), Some(3));
        assert_eq!(options.get_bool(option::SSL_VERIFY_PEER), Some(true));
        assert_eq!(options.len(), 4);
    }

    #[test]
    fn duration_accepts_int_and_float_seconds() {
        let mut options = RequestOptions::new();
        options.set(option::CONNECTION_TIMEOUT, 10_i64);
        assert_eq!(
            options.get_duration(option::CONNECTION_TIMEOUT),
            Some(Duration::from_secs(10))
        );

        options.set(option::CONNECTION_TIMEOUT, 0.25_f64);
        assert_eq!(
            options.get_duration(option::CONNECTION_TIMEOUT),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut options = RequestOptions::new();
        options.set(option::CONNECTION_TIMEOUT, -1_i64);
        assert_eq!(options.get_duration(option::CONNECTION_TIMEOUT), None);

        options.set(option::CONNECTION_TIMEOUT, -0.5_f64);
        assert_eq!(options.get_duration(option::CONNECTION_TIMEOUT), None);
    }

    #[test]
    fn non_callback_value_is_not_a_callback() {
        let mut options = RequestOptions::new();
        options.set(option::ON_COMPLETED_CALLBACK, "not a function");

        assert!(options.get_callback(option::ON_COMPLETED_CALLBACK).is_none());
        // The value itself is still stored verbatim.
        assert_eq!(
            options.get_str(option::ON_COMPLETED_CALLBACK),
            Some("not a function")
        );
    }

    #[test]
    fn callbacks_compare_by_identity() {
        let a = OptionValue::callback(|_| {});
        let a_clone = a.clone();
        let b = OptionValue::callback(|_| {});

        assert_eq!(a, a_clone);
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_sorted_with_callbacks_masked() {
        let mut options = RequestOptions::new();
        options.set("c", OptionValue::callback(|_| {}));
        options.set("a", "x");
        options.set("b", 2_i64);

        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"a":"x","b":2,"c":"<callback>"}"#);
    }

    #[test]
    fn remove_and_clear() {
        let mut options = RequestOptions::new();
        options.set(option::METHOD, "POST");
        options.set(option::CONTENT, "payload");

        assert!(options.remove(option::METHOD).is_some());
        assert!(options.get(option::METHOD).is_none());

        options.clear();
        assert!(options.is_empty());
    }
}
