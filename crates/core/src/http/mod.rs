//! HTTP request and response primitives over caller-owned buffers
//!
//! Neither type allocates. A [`Request`] copies its URL and headers into byte
//! regions the caller provides; a [`Response`] is a window over the raw
//! HTTP/1.1 bytes a transport wrote, parsed on demand.

mod request;
mod response;

pub use request::{Headers, Request};
pub use response::{Response, ResponseHeaders, StatusLine};

use std::fmt;

/// Authorization header name used when injecting bearer tokens
pub const HEADER_AUTHORIZATION: &str = "authorization";
/// Content type header name
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
/// User agent header name
pub const HEADER_USER_AGENT: &str = "User-Agent";
/// Standard retry hint, in seconds
pub const HEADER_RETRY_AFTER: &str = "Retry-After";
/// Retry hint in milliseconds
pub const HEADER_RETRY_AFTER_MS: &str = "retry-after-ms";
/// Vendor-prefixed retry hint in milliseconds
pub const HEADER_X_MS_RETRY_AFTER_MS: &str = "x-ms-retry-after-ms";

/// Form content type used by the token endpoint
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method token as sent on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `status` is in the 2xx range
#[must_use]
pub const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}
