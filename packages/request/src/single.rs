//! Single buffered transfers over a full HTTP client.

use std::io;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::runtime::{Builder, Runtime};

use crate::error::Error;
use crate::options::{option, OptionValue, RequestOptions};
use crate::request::{HttpRequest, RequestOutcome};
use crate::transfer::{Transfer, TransferInfo, TransferOutcome, TransferRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// `last_error_code` value for transport failures surfaced by a transfer.
const TRANSPORT_ERROR: i32 = 1;

/// Everything a transfer needs, resolved ahead of time so the future
/// borrows nothing from the request.
struct TransferPlan {
    client: reqwest::Client,
    url: String,
    method: http::Method,
    content_type: Option<String>,
    body: Option<String>,
    buffer: bool,
}

async fn run_transfer(plan: TransferPlan) -> TransferOutcome {
    let TransferPlan {
        client,
        url,
        method,
        content_type,
        body,
        buffer,
    } = plan;

    let started = Instant::now();
    let mut info = TransferInfo {
        url: url.clone(),
        ..TransferInfo::default()
    };

    let mut builder = client.request(method, url);
    if let Some(content_type) = content_type {
        builder = builder.header(http::header::CONTENT_TYPE, content_type);
    }
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let outcome_body = match builder.send().await {
        Ok(response) => {
            info.url = response.url().to_string();
            info.status = response.status().as_u16();
            info.content_type = response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            info.content_length = response.content_length();

            if buffer {
                match response.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        info.error = err.to_string();
                        Bytes::new()
                    }
                }
            } else {
                Bytes::new()
            }
        }
        Err(err) => {
            info.error = err.to_string();
            Bytes::new()
        }
    };

    info.total_time = started.elapsed();

    TransferOutcome {
        body: outcome_body,
        info,
    }
}

/// A request executed as one complete transfer.
///
/// Unlike the socket dispatchers this waits for the response and records
/// its metadata. Executed inline it drives the transfer on a private
/// current-thread context; handed to a multiplexing engine via
/// [`TransferRequest::begin_transfer`] it runs wherever the engine says.
///
/// ```ignore
/// use fanout_request::{option, HttpRequest, SingleRequest};
///
/// let mut request = SingleRequest::with_url("http://api.example.org/report");
/// let outcome = request.execute()?.into_transfer().unwrap();
/// println!("{} bytes", outcome.body.len());
/// ```
pub struct SingleRequest {
    options: RequestOptions,
    context: Option<Runtime>,
    last_info: Option<TransferInfo>,
    last_error: String,
    last_error_code: i32,
}

impl SingleRequest {
    pub fn new() -> Self {
        let mut options = RequestOptions::new();
        options.set(option::BUFFER_RESPONSE, true);

        Self {
            options,
            context: None,
            last_info: None,
            last_error: String::new(),
            last_error_code: 0,
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let mut request = Self::new();
        request.options.set(option::URL, url.into());
        request
    }

    /// The private context, created on first use.
    fn context(&mut self) -> Result<&Runtime, Error> {
        if self.context.is_none() {
            self.context = Some(Builder::new_current_thread().enable_all().build()?);
        }
        self.context
            .as_ref()
            .ok_or_else(|| Error::Io(io::Error::other("multiplexing context unavailable")))
    }

    fn plan(&self) -> Result<TransferPlan, Error> {
        let timeout = self
            .options
            .get_duration(option::CONNECTION_TIMEOUT)
            .unwrap_or(DEFAULT_TIMEOUT);
        let follow = self
            .options
            .get_bool(option::FOLLOW_LOCATION)
            .unwrap_or(false);
        let verify = self.options.get_bool(option::SSL_VERIFY_PEER).unwrap_or(true);

        let redirect = if follow {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .redirect(redirect)
            .danger_accept_invalid_certs(!verify)
            .build()?;

        let method = self
            .options
            .get_str(option::METHOD)
            .and_then(|m| http::Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .unwrap_or(http::Method::GET);

        Ok(TransferPlan {
            client,
            url: self.options.get_str(option::URL).unwrap_or("").to_string(),
            method,
            content_type: self.options.get_str(option::CONTENT_TYPE).map(String::from),
            body: self.options.get_str(option::CONTENT).map(String::from),
            buffer: self
                .options
                .get_bool(option::BUFFER_RESPONSE)
                .unwrap_or(true),
        })
    }

    fn record_outcome(&mut self, info: &TransferInfo) {
        if info.is_error() {
            self.last_error = info.error.clone();
            self.last_error_code = TRANSPORT_ERROR;
        } else {
            self.last_error.clear();
            self.last_error_code = 0;
        }
        self.last_info = Some(info.clone());
    }
}

impl Default for SingleRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequest for SingleRequest {
    fn ping(&mut self) -> bool {
        let Some(url) = self.options.get_str(option::URL).map(String::from) else {
            return false;
        };

        let client = match self.plan() {
            Ok(plan) => plan.client,
            Err(_) => return false,
        };

        let probe = async move { client.head(url).send().await.is_ok() };
        match self.context() {
            Ok(context) => context.block_on(probe),
            Err(_) => false,
        }
    }

    fn set_option(&mut self, name: &str, value: OptionValue) {
        self.options.set(name, value);
    }

    fn get_option(&self, name: &str) -> Option<OptionValue> {
        self.options.get(name).cloned()
    }

    fn execute(&mut self) -> Result<RequestOutcome, Error> {
        let transfer = self.begin_transfer()?;
        let outcome = self.context()?.block_on(transfer.into_future());
        self.record_outcome(&outcome.info);
        Ok(RequestOutcome::Transfer(outcome))
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn last_error_code(&self) -> i32 {
        self.last_error_code
    }

    fn last_transfer_info(&self, name: Option<&str>) -> Option<OptionValue> {
        let info = self.last_info.as_ref()?;
        match name {
            Some(name) => info.field(name),
            None => serde_json::to_string(info).ok().map(OptionValue::Str),
        }
    }

    fn options(&self) -> RequestOptions {
        self.options.clone()
    }
}

impl TransferRequest for SingleRequest {
    fn begin_transfer(&mut self) -> Result<Transfer, Error> {
        let plan = self.plan()?;
        Ok(Transfer::new(run_transfer(plan)))
    }
}
