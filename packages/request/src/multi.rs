//! Multiplexed transfer execution.

use std::collections::HashSet;

use bytes::Bytes;
use tokio::runtime::{Builder, Runtime, RuntimeFlavor};
use tokio::task::JoinSet;

use crate::error::Error;
use crate::options::{option, OptionValue, RequestOptions};
use crate::request::{HttpRequest, RequestOutcome};
use crate::transfer::{TransferInfo, TransferOutcome, TransferRequest};

/// The execution context a batch of transfers is multiplexed on.
///
/// Only current-thread runtimes are accepted; the engine drives the whole
/// batch from the calling thread with `block_on`, so a multi-threaded
/// runtime would be the wrong kind of context to hand it.
pub struct MultiContext {
    runtime: Runtime,
    max_active: Option<usize>,
}

impl MultiContext {
    /// Build a context with its own current-thread runtime.
    pub fn new() -> Result<Self, Error> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            max_active: None,
        })
    }

    /// Wrap a caller-supplied runtime, rejecting the wrong flavor.
    pub fn try_from_runtime(runtime: Runtime) -> Result<Self, Error> {
        match runtime.handle().runtime_flavor() {
            RuntimeFlavor::CurrentThread => Ok(Self {
                runtime,
                max_active: None,
            }),
            flavor => Err(Error::InvalidContext {
                flavor: format!("{flavor:?}"),
            }),
        }
    }

    fn apply_option(&mut self, name: &str, value: &OptionValue) {
        match name {
            option::MAX_ACTIVE_TRANSFERS => {
                self.max_active = value.as_i64().filter(|n| *n > 0).map(|n| n as usize);
            }
            _ => {
                tracing::debug!(name, "option not recognized by the context");
            }
        }
    }
}

/// Callback receiving each completed transfer's body and metadata.
pub type TransferCallback = Box<dyn FnMut(Bytes, &TransferInfo)>;

/// Drives many transfers concurrently and hands out completions as they
/// arrive.
///
/// Requests are registered up front and dispatched together by
/// [`execute`](HttpRequest::execute). Outcomes are delivered in
/// completion order, either collected into a batch or streamed through
/// a callback set with [`set_callback`](MultiRequest::set_callback).
///
/// ```ignore
/// use fanout_request::{MultiContext, MultiRequest, HttpRequest, SingleRequest};
///
/// let mut engine = MultiRequest::new(MultiContext::new()?);
/// engine.add_request(Box::new(SingleRequest::with_url("http://a.example.org")));
/// engine.add_request(Box::new(SingleRequest::with_url("http://b.example.org")));
///
/// engine.set_callback(|body, info| {
///     println!("{}: {} bytes", info.url, body.len());
/// });
/// engine.execute()?;
/// ```
pub struct MultiRequest {
    context: MultiContext,
    requests: Vec<Box<dyn TransferRequest>>,
    callback: Option<TransferCallback>,
    options: RequestOptions,
    pending: HashSet<u64>,
    next_transfer_id: u64,
    last_error: String,
    last_error_code: i32,
}

impl MultiRequest {
    pub fn new(context: MultiContext) -> Self {
        Self {
            context,
            requests: Vec::new(),
            callback: None,
            options: RequestOptions::new(),
            pending: HashSet::new(),
            next_transfer_id: 0,
            last_error: String::new(),
            last_error_code: 0,
        }
    }

    /// Register a request. Nothing is dispatched until `execute`.
    pub fn add_request(&mut self, request: Box<dyn TransferRequest>) {
        self.requests.push(request);
    }

    /// Stream completions to `callback` instead of collecting a batch.
    pub fn set_callback(&mut self, callback: impl FnMut(Bytes, &TransferInfo) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Number of registered requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl HttpRequest for MultiRequest {
    /// True when every registered request pings true; an empty engine
    /// pings false. Stops probing at the first unreachable endpoint.
    fn ping(&mut self) -> bool {
        if self.requests.is_empty() {
            return false;
        }
        self.requests.iter_mut().all(|request| request.ping())
    }

    /// Options are applied to the context and mirrored for readback;
    /// they are not forwarded to registered requests.
    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.context.apply_option(name, &value);
        self.options.set(name, value);
    }

    fn get_option(&self, name: &str) -> Option<OptionValue> {
        self.options.get(name).cloned()
    }

    fn execute(&mut self) -> Result<RequestOutcome, Error> {
        self.last_error.clear();
        self.last_error_code = 0;
        self.pending.clear();

        let mut queue = Vec::with_capacity(self.requests.len());
        for request in &mut self.requests {
            // Bodies have to be buffered for delivery to make sense.
            request.set_option(option::BUFFER_RESPONSE, OptionValue::Bool(true));

            let transfer = request.begin_transfer()?;
            let id = self.next_transfer_id;
            self.next_transfer_id += 1;
            self.pending.insert(id);
            queue.push((id, transfer));
        }

        let streamed = self.callback.is_some();
        let max_active = self.context.max_active.unwrap_or(usize::MAX);
        let runtime = &self.context.runtime;
        let callback = &mut self.callback;
        let pending = &mut self.pending;

        let mut batch = Vec::new();
        let mut context_error: Option<tokio::task::JoinError> = None;

        runtime.block_on(async {
            let mut joins: JoinSet<(u64, TransferOutcome)> = JoinSet::new();
            let mut queue = queue.into_iter();

            loop {
                // Top up to the concurrency cap before waiting.
                while joins.len() < max_active {
                    let Some((id, transfer)) = queue.next() else {
                        break;
                    };
                    joins.spawn(async move { (id, transfer.into_future().await) });
                }

                match joins.join_next().await {
                    Some(Ok((id, outcome))) => {
                        pending.remove(&id);
                        match callback.as_mut() {
                            Some(callback) => {
                                let TransferOutcome { body, info } = outcome;
                                callback(body, &info);
                            }
                            None => batch.push(outcome),
                        }
                    }
                    Some(Err(err)) => {
                        context_error = Some(err);
                    }
                    None => break,
                }
            }
        });

        if let Some(err) = context_error {
            tracing::warn!(error = %err, "multiplexing context fault");
            self.pending.clear();
            self.last_error = err.to_string();
            self.last_error_code = -1;
        } else {
            debug_assert!(self.pending.is_empty());
        }

        if streamed {
            Ok(RequestOutcome::None)
        } else {
            Ok(RequestOutcome::Batch(batch))
        }
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn last_error_code(&self) -> i32 {
        self.last_error_code
    }

    /// Completion messages are consumed by the drain loop, so there is
    /// nothing left to report here.
    fn last_transfer_info(&self, _name: Option<&str>) -> Option<OptionValue> {
        None
    }

    fn options(&self) -> RequestOptions {
        self.options.clone()
    }
}
