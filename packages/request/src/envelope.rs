//! Response envelopes describing the outcome of a socket dispatch.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::Error;

/// Field names populated on a [`ResponseEnvelope`].
pub mod field {
    pub const HOST: &str = "host";
    pub const PORT: &str = "port";
    pub const PATH: &str = "path";
    /// Acknowledgement line, or the failure description when none arrived.
    pub const RESPONSE_MESSAGE: &str = "response_message";
    /// Whether the request message was fully written.
    pub const WAS_COMPLETED: &str = "was_completed";
    /// Zero-indexed write attempt that succeeded, the configured retry
    /// count when every attempt failed, or -1 when no connection opened.
    pub const CONNECTION_FAILURE: &str = "connection_failure";
    /// Wall-clock seconds spent on the dispatch.
    pub const REQUEST_PROC_TIME: &str = "request_proc_time";
    /// Whether a redirect target replaced the configured URL.
    pub const FOLLOWED_LOCATION: &str = "followed_location";
    /// Whether the acknowledgement carried the acceptance status.
    pub const WAS_ACCEPTED: &str = "was_accepted";
}

/// A single envelope field value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl EnvelopeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnvelopeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            EnvelopeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EnvelopeValue::Float(f) => Some(*f),
            EnvelopeValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EnvelopeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for EnvelopeValue {
    fn from(value: &str) -> Self {
        EnvelopeValue::Str(value.to_string())
    }
}

impl From<String> for EnvelopeValue {
    fn from(value: String) -> Self {
        EnvelopeValue::Str(value)
    }
}

impl From<i64> for EnvelopeValue {
    fn from(value: i64) -> Self {
        EnvelopeValue::Int(value)
    }
}

impl From<i32> for EnvelopeValue {
    fn from(value: i32) -> Self {
        EnvelopeValue::Int(value as i64)
    }
}

impl From<u16> for EnvelopeValue {
    fn from(value: u16) -> Self {
        EnvelopeValue::Int(value as i64)
    }
}

impl From<f64> for EnvelopeValue {
    fn from(value: f64) -> Self {
        EnvelopeValue::Float(value)
    }
}

impl From<bool> for EnvelopeValue {
    fn from(value: bool) -> Self {
        EnvelopeValue::Bool(value)
    }
}

/// Outcome record handed to completion and failure callbacks.
///
/// Dispatchers build the envelope; callers only read it. Fields that do
/// not apply to a dispatch mode are absent rather than defaulted, so
/// [`has`](ResponseEnvelope::has) is the way to probe for them.
#[derive(Clone, Debug, Default)]
pub struct ResponseEnvelope {
    fields: BTreeMap<String, EnvelopeValue>,
}

impl ResponseEnvelope {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: &str, value: impl Into<EnvelopeValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Read a field, erroring on names the dispatch never populated.
    pub fn get(&self, name: &str) -> Result<&EnvelopeValue, Error> {
        self.fields.get(name).ok_or_else(|| Error::UnknownField {
            name: name.to_string(),
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &EnvelopeValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render the envelope as a JSON object with sorted keys.
    pub fn as_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_default()
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
