use std::fmt;
use std::time::Duration;

use nimbus_common::error::{SdkError, SdkResult};
use nimbus_common::time::{Clock, SystemClock, NEVER_EXPIRES};
use nimbus_core::http::{Method, Request, Response};
use nimbus_core::Transport;
use reqwest::blocking::Client as BlockingClient;
use reqwest::header::TRANSFER_ENCODING;
use tracing::{debug, warn};

use crate::errors::{transport_error, InfraError, InfraResult};

/// Blocking HTTP/1.1 transport
///
/// Serialises a core [`Request`] into a `reqwest` call and writes the answer
/// back as raw `HTTP/1.1 <status> <reason>` bytes so the core parsers can
/// read it. Retries are left to the pipeline's retry policy.
///
/// A request whose context carries a deadline is sent with a timeout no
/// longer than the time left on the wall clock.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: BlockingClient,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// `InfraError::Config` if the TLS backend cannot be initialised.
    pub fn new() -> InfraResult<Self> {
        Self::builder().build()
    }

    /// Per-request timeout derived from the context deadline, or `None` when
    /// the client-wide timeout already applies
    ///
    /// # Errors
    /// `Cancelled` when the deadline has already passed.
    fn deadline_timeout(&self, expiration: i64, now: i64) -> SdkResult<Option<Duration>> {
        if expiration == NEVER_EXPIRES {
            return Ok(None);
        }
        let remaining = match u64::try_from(expiration.saturating_sub(now)) {
            Ok(msec) if msec > 0 => Duration::from_millis(msec),
            _ => return Err(SdkError::Cancelled),
        };
        Ok((remaining < self.timeout).then_some(remaining))
    }

    fn write_reply(
        reply: reqwest::blocking::Response,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        let status = reply.status();
        response.write(b"HTTP/1.1 ")?;
        response.write(status.as_str().as_bytes())?;
        response.write(b" ")?;
        response.write(status.canonical_reason().unwrap_or_default().as_bytes())?;
        response.write(b"\r\n")?;

        for (name, value) in reply.headers() {
            // The body below is already de-chunked.
            if name == TRANSFER_ENCODING {
                continue;
            }
            let Ok(value) = value.to_str() else {
                debug!(header = %name, "skipping non-ASCII response header");
                continue;
            };
            response.write(name.as_str().as_bytes())?;
            response.write(b": ")?;
            response.write(value.as_bytes())?;
            response.write(b"\r\n")?;
        }
        response.write(b"\r\n")?;

        let body = reply.bytes().map_err(|err| {
            warn!(error = %err, "failed to read HTTP response body");
            transport_error(&err)
        })?;
        response.write(&body)
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        let method = to_reqwest_method(request.method());
        let url = request.url();

        let expiration = request.context().expiration();
        let deadline = self
            .deadline_timeout(expiration, SystemClock.now_msec())
            .inspect_err(|_| debug!(%method, "deadline passed before send"))?;

        let mut builder = self.client.request(method.clone(), url);
        if let Some(remaining) = deadline {
            builder = builder.timeout(remaining);
        }
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        if !request.body().is_empty() {
            builder = builder.body(request.body().to_vec());
        }

        debug!(%method, url = url.split('?').next().unwrap_or_default(), "sending HTTP request");

        let reply = builder.send().map_err(|err| {
            warn!(%method, error = %err, "HTTP request failed");
            transport_error(&err)
        })?;
        debug!(%method, status = %reply.status(), "received HTTP response");

        response.reset();
        Self::write_reply(reply, response)
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    accept_invalid_certs: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Total time allowed for one exchange, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// # Errors
    /// `InfraError::Config` if the client cannot be constructed.
    pub fn build(self) -> InfraResult<ReqwestTransport> {
        let mut builder = BlockingClient::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .no_proxy();

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|err| InfraError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(ReqwestTransport { client, timeout: self.timeout })
    }
}
