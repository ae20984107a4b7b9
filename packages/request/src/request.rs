//! The request contract shared by every dispatcher.

use crate::error::Error;
use crate::options::{OptionValue, RequestOptions};
use crate::transfer::TransferOutcome;

/// What an [`execute`](HttpRequest::execute) call produced.
///
/// Dispatchers differ in what they can report: socket dispatchers only
/// know whether the message left, transfer dispatchers hand back bodies.
#[derive(Clone, Debug)]
pub enum RequestOutcome {
    /// A socket dispatch; `true` when the message was fully written.
    Completed(bool),
    /// A single buffered transfer.
    Transfer(TransferOutcome),
    /// One outcome per multiplexed transfer, in completion order.
    Batch(Vec<TransferOutcome>),
    /// Nothing to hand back, e.g. results were streamed to a callback.
    None,
}

impl RequestOutcome {
    /// Whether the dispatch ran without a recorded failure.
    pub fn completed(&self) -> bool {
        match self {
            RequestOutcome::Completed(done) => *done,
            RequestOutcome::Transfer(outcome) => !outcome.info.is_error(),
            RequestOutcome::Batch(batch) => batch.iter().all(|t| !t.info.is_error()),
            RequestOutcome::None => true,
        }
    }

    pub fn into_transfer(self) -> Option<TransferOutcome> {
        match self {
            RequestOutcome::Transfer(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn into_batch(self) -> Option<Vec<TransferOutcome>> {
        match self {
            RequestOutcome::Batch(batch) => Some(batch),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RequestOutcome::None)
    }
}

/// A configurable, executable HTTP request.
///
/// Implementations carry their configuration as named options so callers
/// can treat dispatch strategies interchangeably: set options, probe with
/// [`ping`](HttpRequest::ping), then [`execute`](HttpRequest::execute).
pub trait HttpRequest {
    /// Probe whether the configured endpoint is reachable.
    fn ping(&mut self) -> bool;

    /// Set a named option. Unknown names are stored and ignored.
    fn set_option(&mut self, name: &str, value: OptionValue);

    /// Read back a previously set option.
    fn get_option(&self, name: &str) -> Option<OptionValue>;

    /// Dispatch the request.
    fn execute(&mut self) -> Result<RequestOutcome, Error>;

    /// Human-readable description of the last failure, or empty.
    fn last_error(&self) -> String;

    /// Numeric code of the last failure, `0` when none.
    fn last_error_code(&self) -> i32;

    /// Metadata about the most recent dispatch.
    ///
    /// With a name, the matching detail; with `None`, an
    /// implementation-defined summary of everything recorded.
    fn last_transfer_info(&self, name: Option<&str>) -> Option<OptionValue>;

    /// Snapshot of the current option set.
    fn options(&self) -> RequestOptions;

    /// Alias for [`execute`](HttpRequest::execute).
    fn invoke(&mut self) -> Result<RequestOutcome, Error> {
        self.execute()
    }
}

/// A request that answers without touching the network.
///
/// Stands in where a dispatcher is required but dispatch is disabled.
#[derive(Debug, Default)]
pub struct NullRequest;

impl NullRequest {
    pub fn new() -> Self {
        Self
    }
}

impl HttpRequest for NullRequest {
    fn ping(&mut self) -> bool {
        false
    }

    fn set_option(&mut self, _name: &str, _value: OptionValue) {}

    fn get_option(&self, _name: &str) -> Option<OptionValue> {
        None
    }

    fn execute(&mut self) -> Result<RequestOutcome, Error> {
        Ok(RequestOutcome::None)
    }

    fn last_error(&self) -> String {
        String::new()
    }

    fn last_error_code(&self) -> i32 {
        0
    }

    fn last_transfer_info(&self, _name: Option<&str>) -> Option<OptionValue> {
        None
    }

    fn options(&self) -> RequestOptions {
        RequestOptions::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::option;

    #[test]
    fn null_request_is_inert() {
        let mut request = NullRequest::new();
        request.set_option(option::URL, "http://example.org".into());

        assert!(!request.ping());
        assert!(request.get_option(option::URL).is_none());
        assert!(request.options().is_empty());
        assert!(request.execute().unwrap().is_none());
        assert_eq!(request.last_error(), "");
        assert_eq!(request.last_error_code(), 0);
        assert!(request.last_transfer_info(None).is_none());
    }

    #[test]
    fn invoke_is_execute() {
        let mut request = NullRequest::new();
        assert!(request.invoke().unwrap().is_none());
    }

    #[test]
    fn outcome_completion() {
        assert!(RequestOutcome::Completed(true).completed());
        assert!(!RequestOutcome::Completed(false).completed());
        assert!(RequestOutcome::None.completed());
        assert!(RequestOutcome::Batch(Vec::new()).completed());
    }
}
