//! Transfer outcomes and the futures that produce them.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Error;
use crate::options::OptionValue;
use crate::request::HttpRequest;

/// Metadata recorded for one transfer.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TransferInfo {
    /// Effective URL after any redirects.
    pub url: String,
    /// Response status, `0` when no response arrived.
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub total_time: Duration,
    /// Transport failure description, empty on success.
    pub error: String,
}

impl TransferInfo {
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Look up a single detail by name.
    pub fn field(&self, name: &str) -> Option<OptionValue> {
        match name {
            "url" => Some(OptionValue::Str(self.url.clone())),
            "status" => Some(OptionValue::Int(self.status as i64)),
            "content_type" => self.content_type.clone().map(OptionValue::Str),
            "content_length" => self.content_length.map(|n| OptionValue::Int(n as i64)),
            "total_time" => Some(OptionValue::Float(self.total_time.as_secs_f64())),
            "error" => Some(OptionValue::Str(self.error.clone())),
            _ => None,
        }
    }
}

/// Body plus metadata from one completed transfer.
#[derive(Clone, Debug, Default)]
pub struct TransferOutcome {
    /// Response body; empty when buffering was off or nothing arrived.
    pub body: Bytes,
    pub info: TransferInfo,
}

/// An in-flight transfer, ready to be driven by a multiplexing context.
///
/// Transfers always resolve: transport failures land in
/// [`TransferInfo::error`] rather than aborting the batch they run in.
pub struct Transfer {
    future: Pin<Box<dyn Future<Output = TransferOutcome> + Send>>,
}

impl Transfer {
    pub(crate) fn new(future: impl Future<Output = TransferOutcome> + Send + 'static) -> Self {
        Self {
            future: Box::pin(future),
        }
    }

    pub(crate) fn into_future(self) -> Pin<Box<dyn Future<Output = TransferOutcome> + Send>> {
        self.future
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transfer(<pending>)")
    }
}

/// A request whose dispatch can be handed off for multiplexed execution.
pub trait TransferRequest: HttpRequest {
    /// Split off a transfer representing this request's dispatch.
    ///
    /// The caller drives the returned transfer; outcomes produced this
    /// way do not update the request's own `last_transfer_info`.
    fn begin_transfer(&mut self) -> Result<Transfer, Error>;
}
