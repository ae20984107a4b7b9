//! Raw-socket dispatch.
//!
//! Requests are written straight onto a TCP (or TLS) stream and the
//! connection is closed after reading at most one acknowledgement line.
//! The point is to hand work to an endpoint without waiting for it to
//! finish, so everything here is tuned for "write, glance, hang up".

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConnection, DigitallySignedStruct, SignatureScheme, StreamOwned};

use crate::envelope::{field, ResponseEnvelope};
use crate::options::{option, socket_flags, RequestOptions};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const ACCEPTED: u16 = 202;
const MOVED_PERMANENTLY: u16 = 301;

/// URL pieces a socket dispatch actually needs.
///
/// Resolution never fails: inputs that cannot be parsed fall back to an
/// empty host, which surfaces later as a connection failure.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl UrlParts {
    pub fn resolve(raw: &str) -> Self {
        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };

        let url = match url::Url::parse(&candidate) {
            Ok(url) => url,
            Err(_) => {
                return Self {
                    scheme: "http".to_string(),
                    host: String::new(),
                    port: 80,
                    path: "/".to_string(),
                }
            }
        };

        let scheme = url.scheme().to_string();
        let host = url.host_str().unwrap_or("").to_string();
        let port = url.port().unwrap_or_else(|| default_port(&scheme));

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        if path.is_empty() {
            path = "/".to_string();
        }

        Self {
            scheme,
            host,
            port,
            path,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.scheme.as_str(), "https" | "ssl" | "tls")
    }
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "https" | "ssl" | "tls" => 443,
        _ => 80,
    }
}

/// Dispatch parameters resolved from an option bag, with defaults filled in.
#[derive(Clone, Debug)]
pub(crate) struct SocketConfig {
    pub timeout: Duration,
    pub retries: u32,
    pub verify_peer: bool,
    pub method: String,
    pub content_type: String,
    pub body: String,
    pub version: String,
}

impl SocketConfig {
    pub fn from_options(options: &RequestOptions) -> Self {
        Self {
            timeout: options
                .get_duration(option::CONNECTION_TIMEOUT)
                .unwrap_or(DEFAULT_TIMEOUT),
            retries: options
                .get_i64(option::RETRY_COUNT)
                .filter(|n| *n >= 0)
                .map(|n| n as u32)
                .unwrap_or(DEFAULT_RETRIES),
            verify_peer: options.get_bool(option::SSL_VERIFY_PEER).unwrap_or(false),
            method: options
                .get_str(option::METHOD)
                .unwrap_or("POST")
                .to_ascii_uppercase(),
            content_type: options
                .get_str(option::CONTENT_TYPE)
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            body: options.get_str(option::CONTENT).unwrap_or("").to_string(),
            version: options
                .get_str(option::PROTOCOL_VERSION)
                .unwrap_or("1.1")
                .to_string(),
        }
    }
}

enum SocketStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for SocketStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SocketStream::Plain(stream) => stream.read(buf),
            SocketStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for SocketStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SocketStream::Plain(stream) => stream.write(buf),
            SocketStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SocketStream::Plain(stream) => stream.flush(),
            SocketStream::Tls(stream) => stream.flush(),
        }
    }
}

/// Certificate verifier that accepts everything.
///
/// Peer verification defaults to off for socket dispatch; endpoints are
/// typically self-hosted job queues rather than public services.
#[derive(Debug)]
struct NoVerification(rustls::crypto::CryptoProvider);

impl ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn tls_client_config(verify_peer: bool) -> Arc<rustls::ClientConfig> {
    if verify_peer {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )
    } else {
        Arc::new(
            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerification(
                    rustls::crypto::ring::default_provider(),
                )))
                .with_no_client_auth(),
        )
    }
}

/// Open a stream to the endpoint, wrapping it in TLS when the scheme asks
/// for it. The connection timeout doubles as the read/write timeout.
fn open_stream(parts: &UrlParts, timeout: Duration, verify_peer: bool) -> io::Result<SocketStream> {
    let addr = (parts.host.as_str(), parts.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address for host"))?;

    let stream = TcpStream::connect_timeout(&addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    if !parts.is_tls() {
        return Ok(SocketStream::Plain(stream));
    }

    let server_name = ServerName::try_from(parts.host.clone())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let connection = ClientConnection::new(tls_client_config(verify_peer), server_name)
        .map_err(io::Error::other)?;

    Ok(SocketStream::Tls(Box::new(StreamOwned::new(
        connection, stream,
    ))))
}

fn build_request_message(parts: &UrlParts, config: &SocketConfig) -> String {
    format!(
        "{method} {path} HTTP/{version}\r\n\
         Host: {host}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {length}\r\n\
         Connection: Close\r\n\r\n\
         {body}",
        method = config.method,
        path = parts.path,
        version = config.version,
        host = parts.host,
        content_type = config.content_type,
        length = config.body.len(),
        body = config.body,
    )
}

fn build_probe_message(parts: &UrlParts, config: &SocketConfig) -> String {
    format!(
        "HEAD {path} HTTP/{version}\r\nHost: {host}\r\nConnection: Close\r\n\r\n",
        path = parts.path,
        version = config.version,
        host = parts.host,
    )
}

/// Write the message, retrying on failure.
///
/// Returns whether a write went through and the attempt counter: the
/// zero-indexed attempt that succeeded, or `attempts` when all failed.
fn write_with_retry<W: Write>(stream: &mut W, message: &str, attempts: u32) -> (bool, i64) {
    let mut attempt: u32 = 0;

    while attempt < attempts {
        match stream
            .write_all(message.as_bytes())
            .and_then(|_| stream.flush())
        {
            Ok(()) => return (true, attempt as i64),
            Err(err) => {
                tracing::debug!(attempt, error = %err, "socket write failed");
            }
        }
        attempt += 1;
    }

    (false, attempt as i64)
}

/// Read one acknowledgement line, stripped of its line terminator.
fn read_ack_line<R: Read>(reader: R) -> io::Result<String> {
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Drain the probe response so redirect headers can be inspected.
fn read_probe_response<R: Read>(mut reader: R) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Whether `message` opens with a status line carrying exactly `status`.
fn matches_status(message: &str, status: u16) -> bool {
    let Some(rest) = message.strip_prefix("HTTP/") else {
        return false;
    };

    let mut chars = rest.chars();
    let (Some(major), Some(dot), Some(minor), Some(space)) =
        (chars.next(), chars.next(), chars.next(), chars.next())
    else {
        return false;
    };
    if !major.is_ascii_digit() || dot != '.' || !minor.is_ascii_digit() || space != ' ' {
        return false;
    }

    match chars.as_str().strip_prefix(&status.to_string()) {
        Some(tail) => tail.starts_with(' '),
        None => false,
    }
}

/// Pull the redirect target out of a response.
///
/// Path-absolute targets are rejoined against the probed scheme and host.
/// Anything else is taken verbatim.
fn resolve_location(response: &str, parts: &UrlParts) -> Option<String> {
    let location = response
        .lines()
        .find_map(|line| line.strip_prefix("Location: "))?
        .trim();

    if location.starts_with('/') {
        Some(format!("{}://{}{}", parts.scheme, parts.host, location))
    } else {
        Some(location.to_string())
    }
}

/// What a single socket dispatch observed.
#[derive(Clone, Debug)]
pub(crate) struct SocketOutcome {
    pub response_message: String,
    pub was_completed: bool,
    pub connection_failure: i64,
    pub was_accepted: Option<bool>,
    pub followed_location: Option<bool>,
    pub elapsed: Duration,
}

fn build_envelope(parts: &UrlParts, outcome: &SocketOutcome) -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope::new();
    envelope.insert(field::HOST, parts.host.as_str());
    envelope.insert(field::PORT, parts.port);
    envelope.insert(field::PATH, parts.path.as_str());
    envelope.insert(field::RESPONSE_MESSAGE, outcome.response_message.as_str());
    envelope.insert(field::WAS_COMPLETED, outcome.was_completed);
    envelope.insert(field::CONNECTION_FAILURE, outcome.connection_failure);
    envelope.insert(field::REQUEST_PROC_TIME, outcome.elapsed.as_secs_f64());

    if let Some(followed) = outcome.followed_location {
        envelope.insert(field::FOLLOWED_LOCATION, followed);
    }
    if let Some(accepted) = outcome.was_accepted {
        envelope.insert(field::WAS_ACCEPTED, accepted);
    }

    envelope
}

/// Exactly one callback channel fires per dispatch.
fn dispatch_callbacks(options: &RequestOptions, envelope: &ResponseEnvelope, succeeded: bool) {
    let name = if succeeded {
        option::ON_COMPLETED_CALLBACK
    } else {
        option::ON_FAILED_CALLBACK
    };

    if let Some(callback) = options.get_callback(name) {
        callback(envelope);
    }
}

/// Shared machinery behind the fire-and-forget request types.
///
/// The redirect-aware flavor layers two behaviors on top of the plain
/// one: probes chase a single `301` hop, and dispatch acknowledgements
/// are checked for `202` acceptance.
pub(crate) struct SocketDriver {
    pub(crate) options: RequestOptions,
    redirect_aware: bool,
    followed_location: bool,
    last_error: String,
    last_error_code: i32,
    last_ack: String,
}

impl SocketDriver {
    pub fn new(redirect_aware: bool) -> Self {
        let mut options = RequestOptions::new();
        options.set(option::CONNECTION_TIMEOUT, 15_i64);
        options.set(option::RETRY_COUNT, DEFAULT_RETRIES as i64);
        options.set(option::PROTOCOL_VERSION, "1.1");
        options.set(option::METHOD, "POST");
        options.set(option::CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        options.set(
            option::SOCKET_CLIENT_FLAGS,
            socket_flags::ASYNC_CONNECT | socket_flags::CONNECT,
        );
        options.set(option::SSL_VERIFY_PEER, false);

        if redirect_aware {
            options.set(option::FOLLOW_LOCATION, true);
        }

        Self {
            options,
            redirect_aware,
            followed_location: false,
            last_error: String::new(),
            last_error_code: 0,
            last_ack: String::new(),
        }
    }

    pub fn last_error(&self) -> String {
        self.last_error.clone()
    }

    pub fn last_error_code(&self) -> i32 {
        self.last_error_code
    }

    pub fn last_ack(&self) -> &str {
        &self.last_ack
    }

    pub fn followed_location(&self) -> bool {
        self.followed_location
    }

    fn reset(&mut self) {
        self.last_error.clear();
        self.last_error_code = 0;
        self.last_ack.clear();
    }

    fn record_io_error(&mut self, err: &io::Error) {
        self.last_error = err.to_string();
        self.last_error_code = err.raw_os_error().unwrap_or(0);
    }

    /// Probe the endpoint with a `HEAD` message.
    ///
    /// In redirect-aware mode a `301` answer rewrites the URL option to
    /// the `Location` target. The return value reflects reachability,
    /// not what the probe response said.
    pub fn ping(&mut self) -> bool {
        self.reset();

        let Some(url) = self.options.get_str(option::URL).map(str::to_string) else {
            tracing::debug!("ping without a url option");
            return false;
        };

        let parts = UrlParts::resolve(&url);
        let config = SocketConfig::from_options(&self.options);

        let mut stream = match open_stream(&parts, config.timeout, config.verify_peer) {
            Ok(stream) => stream,
            Err(err) => {
                self.record_io_error(&err);
                return false;
            }
        };

        let probe = build_probe_message(&parts, &config);
        if let Err(err) = stream
            .write_all(probe.as_bytes())
            .and_then(|_| stream.flush())
        {
            self.record_io_error(&err);
            return false;
        }

        if self.redirect_aware && self.options.get_bool(option::FOLLOW_LOCATION).unwrap_or(false) {
            match read_probe_response(&mut stream) {
                Ok(response) => {
                    if matches_status(&response, MOVED_PERMANENTLY) {
                        if let Some(target) = resolve_location(&response, &parts) {
                            tracing::debug!(from = %url, to = %target, "following redirect");
                            self.options.set(option::URL, target);
                            self.followed_location = true;
                        }
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "probe response unavailable");
                }
            }
        }

        true
    }

    /// Dispatch the request and report whether the message was written.
    ///
    /// The envelope handed to callbacks always carries the timing and
    /// failure counters; acceptance fields appear only in redirect-aware
    /// mode.
    pub fn execute(&mut self) -> bool {
        self.reset();

        let url = self.options.get_str(option::URL).unwrap_or("").to_string();
        let parts = UrlParts::resolve(&url);
        let config = SocketConfig::from_options(&self.options);

        let started = Instant::now();
        let mut outcome = SocketOutcome {
            response_message: String::new(),
            was_completed: false,
            connection_failure: -1,
            was_accepted: self.redirect_aware.then_some(false),
            followed_location: self.redirect_aware.then(|| self.followed_location),
            elapsed: Duration::ZERO,
        };

        match open_stream(&parts, config.timeout, config.verify_peer) {
            Ok(mut stream) => {
                let message = build_request_message(&parts, &config);
                let (completed, failure) = write_with_retry(&mut stream, &message, config.retries);
                outcome.was_completed = completed;
                outcome.connection_failure = failure;

                // One glance at the acknowledgement, even after a failed write.
                match read_ack_line(&mut stream) {
                    Ok(line) => {
                        self.last_ack = line.clone();
                        outcome.response_message = line;
                    }
                    Err(err) => self.record_io_error(&err),
                }

                if !completed && self.last_error.is_empty() {
                    self.last_error = "unable to write to the socket".to_string();
                }

                if self.redirect_aware {
                    outcome.was_accepted = Some(matches_status(&outcome.response_message, ACCEPTED));
                }
            }
            Err(err) => {
                outcome.response_message =
                    format!("{} ({})", err, err.raw_os_error().unwrap_or(0));
                self.record_io_error(&err);
            }
        }

        outcome.elapsed = started.elapsed();

        let envelope = build_envelope(&parts, &outcome);
        let succeeded = outcome.was_completed && outcome.was_accepted.unwrap_or(true);
        dispatch_callbacks(&self.options, &envelope, succeeded);

        outcome.was_completed
    }
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn url_parts_with_explicit_port_and_query() {
        let parts = UrlParts::resolve("https://example.org:8443/hooks/run?x=1");

        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.host, "example.org");
        assert_eq!(parts.port, 8443);
        assert_eq!(parts.path, "/hooks/run?x=1");
        assert!(parts.is_tls());
    }

    #[test]
    fn url_parts_fills_scheme_defaults() {
        let parts = UrlParts::resolve("http://example.org");
        assert_eq!(parts.port, 80);
        assert_eq!(parts.path, "/");
        assert!(!parts.is_tls());

        let parts = UrlParts::resolve("https://example.org/x");
        assert_eq!(parts.port, 443);
    }

    #[test]
    fn url_parts_accepts_schemeless_input() {
        let parts = UrlParts::resolve("localhost:8888/endpoint");

        assert_eq!(parts.scheme, "http");
        assert_eq!(parts.host, "localhost");
        assert_eq!(parts.port, 8888);
        assert_eq!(parts.path, "/endpoint");
    }

    #[test]
    fn url_parts_falls_back_on_garbage() {
        let parts = UrlParts::resolve("http://");

        assert_eq!(parts.host, "");
        assert_eq!(parts.port, 80);
        assert_eq!(parts.path, "/");
    }

    #[test]
    fn status_matcher_requires_exact_code() {
        assert!(matches_status("HTTP/1.1 202 Accepted", 202));
        assert!(matches_status("HTTP/1.0 202 Accepted", 202));
        assert!(matches_status("HTTP/1.1 301 Moved Permanently", 301));

        assert!(!matches_status("HTTP/1.1 200 OK", 202));
        assert!(!matches_status("HTTP/1.1 2020 Odd", 202));
        assert!(!matches_status("HTTP/1.1 202", 202));
        assert!(!matches_status("202 Accepted", 202));
        assert!(!matches_status("", 202));
    }

    #[test]
    fn location_header_rejoins_relative_targets() {
        let parts = UrlParts::resolve("http://example.org:8080/old");
        let response = "HTTP/1.1 301 Moved Permanently\r\nLocation: /new\r\n\r\n";

        // The rejoined URL keeps scheme and host, not the probed port.
        assert_eq!(
            resolve_location(response, &parts),
            Some("http://example.org/new".to_string())
        );
    }

    #[test]
    fn location_header_passes_absolute_targets_through() {
        let parts = UrlParts::resolve("http://example.org/old");
        let response =
            "HTTP/1.1 301 Moved Permanently\r\nLocation: http://other.example/abs\r\n\r\n";

        assert_eq!(
            resolve_location(response, &parts),
            Some("http://other.example/abs".to_string())
        );
    }

    #[test]
    fn missing_location_header_yields_none() {
        let parts = UrlParts::resolve("http://example.org/old");
        assert_eq!(resolve_location("HTTP/1.1 301 Moved\r\n\r\n", &parts), None);
    }

    #[test]
    fn request_message_layout() {
        let parts = UrlParts::resolve("http://example.org/inbox");
        let mut options = RequestOptions::new();
        options.set(option::CONTENT, "a=1");
        let config = SocketConfig::from_options(&options);

        assert_eq!(
            build_request_message(&parts, &config),
            "POST /inbox HTTP/1.1\r\n\
             Host: example.org\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: 3\r\n\
             Connection: Close\r\n\r\n\
             a=1"
        );
    }

    #[test]
    fn probe_message_layout() {
        let parts = UrlParts::resolve("http://example.org/inbox");
        let config = SocketConfig::from_options(&RequestOptions::new());

        assert_eq!(
            build_probe_message(&parts, &config),
            "HEAD /inbox HTTP/1.1\r\nHost: example.org\r\nConnection: Close\r\n\r\n"
        );
    }

    struct FlakyWriter {
        failures_left: u32,
        written: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "not yet"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_retry_reports_successful_attempt_index() {
        let mut writer = FlakyWriter {
            failures_left: 0,
            written: Vec::new(),
        };
        assert_eq!(write_with_retry(&mut writer, "msg", 2), (true, 0));
        assert_eq!(writer.written, b"msg");

        let mut writer = FlakyWriter {
            failures_left: 1,
            written: Vec::new(),
        };
        assert_eq!(write_with_retry(&mut writer, "msg", 3), (true, 1));
    }

    #[test]
    fn write_retry_reports_attempt_count_when_exhausted() {
        let mut writer = FlakyWriter {
            failures_left: u32::MAX,
            written: Vec::new(),
        };
        assert_eq!(write_with_retry(&mut writer, "msg", 2), (false, 2));
        assert!(writer.written.is_empty());
    }

    #[test]
    fn ack_line_is_trimmed() {
        let response = Cursor::new(b"HTTP/1.1 202 Accepted\r\nServer: x\r\n".to_vec());
        assert_eq!(read_ack_line(response).unwrap(), "HTTP/1.1 202 Accepted");
    }

    #[test]
    fn config_defaults() {
        let config = SocketConfig::from_options(&RequestOptions::new());

        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retries, 2);
        assert!(!config.verify_peer);
        assert_eq!(config.method, "POST");
        assert_eq!(config.content_type, "application/x-www-form-urlencoded");
        assert_eq!(config.body, "");
        assert_eq!(config.version, "1.1");
    }

    #[test]
    fn config_honors_overrides() {
        let mut options = RequestOptions::new();
        options.set(option::CONNECTION_TIMEOUT, 0.5_f64);
        options.set(option::RETRY_COUNT, 5_i64);
        options.set(option::METHOD, "PUT");
        options.set(option::SSL_VERIFY_PEER, true);

        let config = SocketConfig::from_options(&options);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.retries, 5);
        assert_eq!(config.method, "PUT");
        assert!(config.verify_peer);
    }

    #[test]
    fn method_is_uppercased_in_the_request_line() {
        let parts = UrlParts::resolve("http://example.org/inbox");
        let mut options = RequestOptions::new();
        options.set(option::METHOD, "post");
        let config = SocketConfig::from_options(&options);

        assert_eq!(config.method, "POST");
        assert!(build_request_message(&parts, &config).starts_with("POST /inbox HTTP/1.1\r\n"));
    }

    #[test]
    fn envelope_carries_acceptance_only_in_redirect_mode() {
        let parts = UrlParts::resolve("http://example.org/inbox");
        let mut outcome = SocketOutcome {
            response_message: "HTTP/1.1 202 Accepted".to_string(),
            was_completed: true,
            connection_failure: 0,
            was_accepted: None,
            followed_location: None,
            elapsed: Duration::from_millis(3),
        };

        let envelope = build_envelope(&parts, &outcome);
        assert_eq!(envelope.get(field::HOST).unwrap().as_str(), Some("example.org"));
        assert_eq!(envelope.get(field::PORT).unwrap().as_i64(), Some(80));
        assert_eq!(envelope.get(field::WAS_COMPLETED).unwrap().as_bool(), Some(true));
        assert!(!envelope.has(field::WAS_ACCEPTED));
        assert!(!envelope.has(field::FOLLOWED_LOCATION));

        outcome.was_accepted = Some(true);
        outcome.followed_location = Some(false);
        let envelope = build_envelope(&parts, &outcome);
        assert_eq!(envelope.get(field::WAS_ACCEPTED).unwrap().as_bool(), Some(true));
        assert_eq!(
            envelope.get(field::FOLLOWED_LOCATION).unwrap().as_bool(),
            Some(false)
        );
    }
}
