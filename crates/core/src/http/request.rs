//! Outgoing request built in caller-owned buffers

use std::fmt;
use std::str;

use nimbus_common::error::{SdkError, SdkResult};

use super::Method;
use crate::context::Context;

const HEADER_SEPARATOR: &str = ": ";
const LINE_END: &str = "\r\n";

/// An HTTP request whose URL and header storage belong to the caller
///
/// The URL is copied into `url_buffer` and may later grow through
/// [`Request::append_path`] and [`Request::set_query_parameter`]. Headers are
/// stored as `name: value\r\n` lines in `header_buffer`. Every write checks
/// capacity first and fails with `BufferTooSmall` without touching the buffer.
pub struct Request<'a> {
    context: &'a Context<'a>,
    method: Method,
    url: &'a mut [u8],
    url_len: usize,
    query_start: Option<usize>,
    headers: &'a mut [u8],
    headers_len: usize,
    header_count: usize,
    retry_mark: Option<(usize, usize)>,
    body: &'a [u8],
}

impl<'a> Request<'a> {
    /// Build a request, copying `url` into `url_buffer`
    ///
    /// # Errors
    /// `BufferTooSmall` if `url` does not fit; `InvalidArgument` if it is
    /// empty.
    pub fn new(
        context: &'a Context<'a>,
        method: Method,
        url: &str,
        url_buffer: &'a mut [u8],
        header_buffer: &'a mut [u8],
        body: &'a [u8],
    ) -> SdkResult<Self> {
        if url.is_empty() {
            return Err(SdkError::invalid_argument("url", "must not be empty"));
        }
        if url.len() > url_buffer.len() {
            return Err(SdkError::buffer_too_small("request url", url.len(), url_buffer.len()));
        }
        url_buffer[..url.len()].copy_from_slice(url.as_bytes());

        Ok(Self {
            context,
            method,
            url: url_buffer,
            url_len: url.len(),
            query_start: url.find('?'),
            headers: header_buffer,
            headers_len: 0,
            header_count: 0,
            retry_mark: None,
            body,
        })
    }

    /// Context governing this request's deadline
    #[must_use]
    pub fn context(&self) -> &'a Context<'a> {
        self.context
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Current URL, including any appended path segments and query parameters
    #[must_use]
    pub fn url(&self) -> &str {
        str::from_utf8(&self.url[..self.url_len]).unwrap_or_default()
    }

    #[must_use]
    pub const fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Insert `/segment` at the end of the path, before any query string
    ///
    /// # Errors
    /// `BufferTooSmall` if the grown URL does not fit.
    pub fn append_path(&mut self, segment: &str) -> SdkResult<()> {
        let segment = segment.trim_start_matches('/');
        let at = self.query_start.unwrap_or(self.url_len);
        let needs_slash = at == 0 || self.url[at - 1] != b'/';
        let inserted = segment.len() + usize::from(needs_slash);
        let required = self.url_len + inserted;
        if required > self.url.len() {
            return Err(SdkError::buffer_too_small("request url", required, self.url.len()));
        }

        self.url.copy_within(at..self.url_len, at + inserted);
        let mut cursor = at;
        if needs_slash {
            self.url[cursor] = b'/';
            cursor += 1;
        }
        self.url[cursor..cursor + segment.len()].copy_from_slice(segment.as_bytes());

        self.url_len = required;
        if let Some(query) = self.query_start.as_mut() {
            *query += inserted;
        }
        Ok(())
    }

    /// Append `name=value` to the query string; values are taken verbatim
    ///
    /// # Errors
    /// `InvalidArgument` for an empty name; `BufferTooSmall` if the grown URL
    /// does not fit.
    pub fn set_query_parameter(&mut self, name: &str, value: &str) -> SdkResult<()> {
        if name.is_empty() {
            return Err(SdkError::invalid_argument("query parameter", "name must not be empty"));
        }
        let required = self.url_len + 1 + name.len() + 1 + value.len();
        if required > self.url.len() {
            return Err(SdkError::buffer_too_small("request url", required, self.url.len()));
        }

        let separator = if self.query_start.is_some() { b'&' } else { b'?' };
        if self.query_start.is_none() {
            self.query_start = Some(self.url_len);
        }
        let mut cursor = self.url_len;
        for part in [&[separator][..], name.as_bytes(), &b"="[..], value.as_bytes()] {
            self.url[cursor..cursor + part.len()].copy_from_slice(part);
            cursor += part.len();
        }
        self.url_len = cursor;
        Ok(())
    }

    /// Append a header line
    ///
    /// # Errors
    /// `InvalidArgument` when the name is empty or contains `:`, or either
    /// part contains a line break. `BufferTooSmall` when the line does not
    /// fit; the header block is left untouched.
    pub fn append_header(&mut self, name: &str, value: &str) -> SdkResult<()> {
        if name.is_empty() {
            return Err(SdkError::invalid_argument("header name", "must not be empty"));
        }
        if name.contains([':', '\r', '\n']) {
            return Err(SdkError::invalid_argument("header name", "contains a separator"));
        }
        if value.contains(['\r', '\n']) {
            return Err(SdkError::invalid_argument("header value", "contains a line break"));
        }

        let line_len = name.len() + HEADER_SEPARATOR.len() + value.len() + LINE_END.len();
        let required = self.headers_len + line_len;
        if required > self.headers.len() {
            return Err(SdkError::buffer_too_small(
                "request headers",
                required,
                self.headers.len(),
            ));
        }

        let mut cursor = self.headers_len;
        for part in [name, HEADER_SEPARATOR, value, LINE_END] {
            self.headers[cursor..cursor + part.len()].copy_from_slice(part.as_bytes());
            cursor += part.len();
        }
        self.headers_len = cursor;
        self.header_count += 1;
        Ok(())
    }

    #[must_use]
    pub const fn header_count(&self) -> usize {
        self.header_count
    }

    /// Bytes of header storage in use
    #[must_use]
    pub const fn headers_len(&self) -> usize {
        self.headers_len
    }

    /// Headers in insertion order
    #[must_use]
    pub fn headers(&self) -> Headers<'_> {
        Headers { remaining: str::from_utf8(&self.headers[..self.headers_len]).unwrap_or_default() }
    }

    /// First header with the given name (ASCII case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers().find(|(candidate, _)| candidate.eq_ignore_ascii_case(name)).map(|(_, v)| v)
    }

    /// Remember the current end of the header block
    ///
    /// Headers appended after the mark are per-attempt; see
    /// [`Request::remove_retry_headers`].
    pub fn mark_retry_headers(&mut self) {
        self.retry_mark = Some((self.headers_len, self.header_count));
    }

    /// Drop every header appended since [`Request::mark_retry_headers`]
    pub fn remove_retry_headers(&mut self) {
        if let Some((len, count)) = self.retry_mark {
            self.headers_len = len;
            self.header_count = count;
        }
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url())
            .field("header_count", &self.header_count)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over `(name, value)` header pairs
#[derive(Debug, Clone)]
pub struct Headers<'h> {
    remaining: &'h str,
}

impl<'h> Iterator for Headers<'h> {
    type Item = (&'h str, &'h str);

    fn next(&mut self) -> Option<Self::Item> {
        let (line, rest) = self.remaining.split_once(LINE_END)?;
        self.remaining = rest;
        line.split_once(HEADER_SEPARATOR)
    }
}
