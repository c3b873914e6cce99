//! User agent stamping

use std::fmt::Write as _;

use nimbus_common::error::{SdkError, SdkResult};

use super::{Next, Policy};
use crate::http::{Request, Response, HEADER_USER_AGENT};

/// Capacity of the formatted user agent
pub const USER_AGENT_CAPACITY: usize = 64;

/// Appends `User-Agent: nimbus-<component>/<version>` and forwards
#[derive(Debug, Clone)]
pub struct TelemetryPolicy {
    user_agent: heapless::String<USER_AGENT_CAPACITY>,
}

impl TelemetryPolicy {
    /// # Errors
    /// `InvalidArgument` for an empty component name, `BufferTooSmall` when
    /// the formatted value exceeds [`USER_AGENT_CAPACITY`].
    pub fn new(component: &str) -> SdkResult<Self> {
        if component.is_empty() {
            return Err(SdkError::invalid_argument("component", "must not be empty"));
        }
        let version = env!("CARGO_PKG_VERSION");
        let mut user_agent = heapless::String::new();
        write!(user_agent, "nimbus-{component}/{version}").map_err(|_| {
            SdkError::buffer_too_small(
                "user agent",
                "nimbus-/".len() + component.len() + version.len(),
                USER_AGENT_CAPACITY,
            )
        })?;
        Ok(Self { user_agent })
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Policy for TelemetryPolicy {
    fn process(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        request.append_header(HEADER_USER_AGENT, &self.user_agent)?;
        next.forward(request, response)
    }

    fn name(&self) -> &'static str {
        "telemetry"
    }
}
