//! Request/response logging
//!
//! Only the method, the URL without its query string, the status and timing
//! are logged. Header values and bodies carry credentials and never reach the
//! log.

use nimbus_common::error::{ErrorClassification, SdkResult};
use tracing::{debug, info, warn};

use super::{Next, Policy};
use crate::http::{Request, Response};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPolicy;

impl Policy for LoggingPolicy {
    fn process(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        let clock = next.clock();
        let started = clock.now_msec();
        let url = request.url();
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        debug!(
            method = %request.method(),
            url = %path,
            headers = request.header_count(),
            "sending request"
        );

        let outcome = next.forward(request, response);
        let elapsed_msec = clock.now_msec().saturating_sub(started);
        match &outcome {
            Ok(()) => info!(
                method = %request.method(),
                status = response.status().ok(),
                elapsed_msec,
                "request completed"
            ),
            Err(error) => warn!(
                method = %request.method(),
                error = %error,
                severity = %error.severity(),
                elapsed_msec,
                "request failed"
            ),
        }
        outcome
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}
