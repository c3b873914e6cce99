//! Terminal policy and the transport seam

use nimbus_common::error::{SdkError, SdkResult};
use tracing::debug;

use super::{Next, Policy};
use crate::http::{Request, Response};

/// Moves bytes to a peer and writes the raw HTTP/1.1 answer into `response`
///
/// Implementations write the status line, headers, a blank line and the body,
/// exactly as they came off the wire, and report network failures as
/// `SdkError::Transport`.
pub trait Transport: Send + Sync {
    /// Send `request` and fill `response`
    ///
    /// # Errors
    /// `Transport` on network failure, `BufferTooSmall` when the answer does
    /// not fit the response buffer.
    fn send(&self, request: &Request<'_>, response: &mut Response<'_>) -> SdkResult<()>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        (**self).send(request, response)
    }
}

/// Last policy of every chain: hands the request to the injected transport
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportPolicy;

impl Policy for TransportPolicy {
    fn process(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        if request.context().has_expired(next.clock().now_msec()) {
            debug!(url = %request.url(), "context expired before send");
            return Err(SdkError::Cancelled);
        }
        next.transport().send(request, response)
    }

    fn name(&self) -> &'static str {
        "transport"
    }
}
