//! Deterministic transport double for tests
//!
//! [`ScriptedTransport`] answers requests from a queue of canned raw
//! responses (or errors) and records what it was asked to send. Pair it with
//! [`MockClock`](nimbus_common::time::MockClock) to drive a pipeline without a
//! network.

use std::collections::VecDeque;
use std::fmt;

use nimbus_common::error::{SdkError, SdkResult, TransportErrorKind};
use parking_lot::Mutex;

use crate::http::{Method, Request, Response};
use crate::pipeline::Transport;

/// Capacity of a recorded URL
pub const RECORDED_URL_CAPACITY: usize = 256;
/// Capacity of the recorded header block
pub const RECORDED_HEADERS_CAPACITY: usize = 2304;
/// Capacity of a recorded body
pub const RECORDED_BODY_CAPACITY: usize = 1024;
/// Capacity of one scripted response
pub const SCRIPTED_RESPONSE_CAPACITY: usize = 4096;

/// What the transport saw for one `send`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub header_count: usize,
    url: heapless::String<RECORDED_URL_CAPACITY>,
    headers: heapless::String<RECORDED_HEADERS_CAPACITY>,
    body: heapless::Vec<u8, RECORDED_BODY_CAPACITY>,
}

impl RecordedRequest {
    fn capture(request: &Request<'_>) -> SdkResult<Self> {
        let mut url = heapless::String::new();
        url.push_str(request.url()).map_err(|()| {
            SdkError::buffer_too_small("recorded url", request.url().len(), RECORDED_URL_CAPACITY)
        })?;

        let mut headers = heapless::String::new();
        for (name, value) in request.headers() {
            for part in [name, ": ", value, "\r\n"] {
                headers.push_str(part).map_err(|()| {
                    SdkError::buffer_too_small(
                        "recorded headers",
                        request.headers_len(),
                        RECORDED_HEADERS_CAPACITY,
                    )
                })?;
            }
        }

        let body = heapless::Vec::from_slice(request.body()).map_err(|()| {
            SdkError::buffer_too_small("recorded body", request.body().len(), RECORDED_BODY_CAPACITY)
        })?;

        Ok(Self { method: request.method(), header_count: request.header_count(), url, headers, body })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Header block exactly as `name: value\r\n` lines
    #[must_use]
    pub fn headers(&self) -> &str {
        &self.headers
    }

    /// Value of the first header with this name (ASCII case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .split("\r\n")
            .filter_map(|line| line.split_once(": "))
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8 text (empty if it is not valid UTF-8)
    #[must_use]
    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }
}

enum Scripted {
    Response(heapless::Vec<u8, SCRIPTED_RESPONSE_CAPACITY>),
    Error(SdkError),
}

/// Transport answering from a script
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw HTTP/1.1 response
    ///
    /// # Errors
    /// `BufferTooSmall` when `raw` exceeds [`SCRIPTED_RESPONSE_CAPACITY`].
    pub fn push_response(&self, raw: &[u8]) -> SdkResult<()> {
        let bytes = heapless::Vec::from_slice(raw).map_err(|()| {
            SdkError::buffer_too_small("scripted response", raw.len(), SCRIPTED_RESPONSE_CAPACITY)
        })?;
        self.script.lock().push_back(Scripted::Response(bytes));
        Ok(())
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: SdkError) {
        self.script.lock().push_back(Scripted::Error(error));
    }

    /// Number of `send` calls so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Copy of the `index`-th recorded request
    #[must_use]
    pub fn request(&self, index: usize) -> Option<RecordedRequest> {
        self.requests.lock().get(index).cloned()
    }

    /// Requests whose URL equals `url`
    #[must_use]
    pub fn requests_to(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|request| request.url() == url).count()
    }

    /// Scripted answers not yet consumed
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        self.requests.lock().push(RecordedRequest::capture(request)?);
        match self.script.lock().pop_front() {
            Some(Scripted::Response(raw)) => response.write(&raw),
            Some(Scripted::Error(error)) => Err(error),
            None => Err(SdkError::transport(TransportErrorKind::Other, "script exhausted")),
        }
    }
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("pending", &self.pending())
            .field("requests", &self.request_count())
            .finish()
    }
}
