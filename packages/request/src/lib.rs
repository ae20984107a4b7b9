//! # fanout-request
//!
//! HTTP request dispatch for fanout.
//!
//! This crate puts several dispatch strategies behind one trait: configure
//! a request through named options, probe the endpoint with `ping`, fire
//! it with `execute`. What varies is how the dispatch happens.
//!
//! ## Dispatch Strategies
//!
//! ### FireAndForgetRequest / RedirectAwareRequest
//!
//! Raw-socket dispatch that does not wait for the endpoint to finish.
//! The request message is written, at most one acknowledgement line is
//! read, and the connection is closed. The redirect-aware flavor also
//! chases one `301` hop on `ping` and checks acknowledgements for
//! `202 Accepted`:
//!
//! ```ignore
//! use fanout_request::{option, FireAndForgetRequest, HttpRequest, OptionValue};
//!
//! let mut request = FireAndForgetRequest::with_url("http://jobs.example.org/enqueue");
//! request.set_option(option::CONTENT, "task=reindex".into());
//! request.set_option(
//!     option::ON_FAILED_CALLBACK,
//!     OptionValue::callback(|envelope| eprintln!("{}", envelope.as_json())),
//! );
//! request.execute()?;
//! ```
//!
//! ### SingleRequest
//!
//! A complete buffered transfer over a full HTTP client:
//!
//! ```ignore
//! use fanout_request::{HttpRequest, SingleRequest};
//!
//! let mut request = SingleRequest::with_url("http://api.example.org/report");
//! let outcome = request.execute()?.into_transfer().unwrap();
//! println!("status {}", outcome.info.status);
//! ```
//!
//! ### MultiRequest
//!
//! Many transfers multiplexed on one current-thread context, drained in
//! completion order:
//!
//! ```ignore
//! use fanout_request::{HttpRequest, MultiContext, MultiRequest, SingleRequest};
//!
//! let mut engine = MultiRequest::new(MultiContext::new()?);
//! engine.add_request(Box::new(SingleRequest::with_url("http://a.example.org")));
//! engine.add_request(Box::new(SingleRequest::with_url("http://b.example.org")));
//!
//! for outcome in engine.execute()?.into_batch().unwrap() {
//!     println!("{}: {} bytes", outcome.info.url, outcome.body.len());
//! }
//! ```
//!
//! ### CachedRequest
//!
//! A decorator serving repeat transfers from a [`fanout_cache::Cache`]:
//!
//! ```ignore
//! use fanout_cache::InMemoryCache;
//! use fanout_request::{CachedRequest, HttpRequest, SingleRequest};
//!
//! let mut request = CachedRequest::new(
//!     Box::new(SingleRequest::with_url("http://api.example.org/rates")),
//!     Box::new(InMemoryCache::new()),
//! );
//! request.execute()?; // dispatched
//! request.execute()?; // served from the cache
//! ```

pub mod cached;
pub mod envelope;
pub mod error;
pub mod fire_and_forget;
pub mod multi;
pub mod options;
pub mod redirect;
pub mod request;
pub mod single;
pub mod transfer;

mod socket;

// Re-export main types
pub use cached::CachedRequest;
pub use envelope::{field, EnvelopeValue, ResponseEnvelope};
pub use error::Error;
pub use fire_and_forget::FireAndForgetRequest;
pub use multi::{MultiContext, MultiRequest, TransferCallback};
pub use options::{option, socket_flags, EnvelopeCallback, OptionValue, RequestOptions};
pub use redirect::RedirectAwareRequest;
pub use request::{HttpRequest, NullRequest, RequestOutcome};
pub use single::SingleRequest;
pub use transfer::{Transfer, TransferInfo, TransferOutcome, TransferRequest};
