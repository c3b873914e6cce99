//! Raw HTTP/1.1 response held in a caller-owned buffer

use std::fmt;
use std::str;

use nimbus_common::error::{SdkError, SdkResult};

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Parsed status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine<'r> {
    pub major_version: u8,
    pub minor_version: u8,
    pub status: u16,
    pub reason: &'r str,
}

/// A response as raw bytes; status, headers and body are parsed on each access
pub struct Response<'a> {
    buffer: &'a mut [u8],
    len: usize,
}

impl<'a> Response<'a> {
    #[must_use]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, len: 0 }
    }

    /// Discard everything written so far
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append raw bytes received from the wire
    ///
    /// # Errors
    /// `BufferTooSmall` if `bytes` does not fit; nothing is written.
    pub fn write(&mut self, bytes: &[u8]) -> SdkResult<()> {
        let required = self.len + bytes.len();
        if required > self.buffer.len() {
            return Err(SdkError::buffer_too_small("response", required, self.buffer.len()));
        }
        self.buffer[self.len..required].copy_from_slice(bytes);
        self.len = required;
        Ok(())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Parse the status line, e.g. `HTTP/1.1 200 OK`
    ///
    /// # Errors
    /// `MalformedResponse` when the buffer does not start with a valid
    /// HTTP/1.x status line.
    pub fn status_line(&self) -> SdkResult<StatusLine<'_>> {
        let head = self.head()?;
        let line = head.split("\r\n").next().unwrap_or_default();

        let rest = line.strip_prefix("HTTP/").ok_or(SdkError::malformed("missing HTTP version"))?;
        let (version, rest) =
            rest.split_once(' ').ok_or(SdkError::malformed("truncated status line"))?;
        let (major, minor) = version.split_once('.').unwrap_or((version, "0"));
        let major_version = major.parse().map_err(|_| SdkError::malformed("bad HTTP version"))?;
        let minor_version = minor.parse().map_err(|_| SdkError::malformed("bad HTTP version"))?;

        let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SdkError::malformed("status code must have three digits"));
        }
        let status = code.parse().map_err(|_| SdkError::malformed("status code is not numeric"))?;

        Ok(StatusLine { major_version, minor_version, status, reason })
    }

    /// Status code from the status line
    ///
    /// # Errors
    /// See [`Response::status_line`].
    pub fn status(&self) -> SdkResult<u16> {
        Ok(self.status_line()?.status)
    }

    /// Header lines between the status line and the blank line
    ///
    /// # Errors
    /// `MalformedResponse` when the head is not terminated.
    pub fn headers(&self) -> SdkResult<ResponseHeaders<'_>> {
        let head = self.head()?;
        let remaining = head.split_once("\r\n").map_or("", |(_, rest)| rest);
        Ok(ResponseHeaders { remaining })
    }

    /// First header with the given name (ASCII case-insensitive); surrounding
    /// whitespace is trimmed from the value
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .ok()?
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Everything after the blank line
    ///
    /// # Errors
    /// `MalformedResponse` when the head is not terminated.
    pub fn body(&self) -> SdkResult<&[u8]> {
        let end = self.head_end()?;
        Ok(&self.as_bytes()[end + HEAD_TERMINATOR.len()..])
    }

    fn head_end(&self) -> SdkResult<usize> {
        self.as_bytes()
            .windows(HEAD_TERMINATOR.len())
            .position(|window| window == HEAD_TERMINATOR)
            .ok_or(SdkError::malformed("missing end of headers"))
    }

    fn head(&self) -> SdkResult<&str> {
        let end = self.head_end()?;
        str::from_utf8(&self.as_bytes()[..end])
            .map_err(|_| SdkError::malformed("response head is not UTF-8"))
    }
}

impl fmt::Debug for Response<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("len", &self.len)
            .field("capacity", &self.buffer.len())
            .field("status", &self.status().ok())
            .finish()
    }
}

/// Iterator over response header `(name, value)` pairs
#[derive(Debug, Clone)]
pub struct ResponseHeaders<'r> {
    remaining: &'r str,
}

impl<'r> Iterator for ResponseHeaders<'r> {
    type Item = (&'r str, &'r str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining.is_empty() {
                return None;
            }
            let (line, rest) = self.remaining.split_once("\r\n").unwrap_or((self.remaining, ""));
            self.remaining = rest;
            // Lines without a colon are skipped rather than ending iteration.
            if let Some((name, value)) = line.split_once(':') {
                return Some((name.trim(), value.trim()));
            }
        }
    }
}
