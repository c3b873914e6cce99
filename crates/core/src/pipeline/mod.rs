//! Request pipeline: an ordered, fixed-length chain of policies
//!
//! A [`Pipeline`] owns nothing but references. Each policy receives a [`Next`]
//! token standing for "the rest of the chain" and decides whether, and how
//! often, to invoke it:
//!
//! ```text
//! Pipeline::process
//!   └─ RetryPolicy        (replays the remainder via Attempts)
//!        └─ CredentialPolicy  (appends authorization, forwards once)
//!             └─ TransportPolicy  (terminal: Transport::send)
//! ```
//!
//! The clock and transport every policy needs travel with the token as a
//! [`PipelineEnv`], so policies hold only their own options.

mod logging;
mod retry;
mod telemetry;
mod transport;

pub use logging::LoggingPolicy;
pub use retry::{Jitter, RetryDecision, RetryOptions, RetryPolicy, MAX_RETRY_STATUSES};
pub use telemetry::TelemetryPolicy;
pub use transport::{Transport, TransportPolicy};

use std::fmt;

use nimbus_common::error::{SdkError, SdkResult};
use nimbus_common::time::Clock;

use crate::http::{Request, Response};

/// One step of the chain
pub trait Policy: Send + Sync {
    /// Transform the request, optionally forward it, transform the response
    ///
    /// # Errors
    /// Whatever the policy or the remainder of the chain reports.
    fn process(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()>;

    /// Short name used in log fields
    fn name(&self) -> &'static str;
}

/// Collaborators injected into every pipeline execution
#[derive(Clone, Copy)]
pub struct PipelineEnv<'e> {
    pub clock: &'e dyn Clock,
    pub transport: &'e dyn Transport,
}

impl fmt::Debug for PipelineEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEnv").finish_non_exhaustive()
    }
}

/// The remainder of the chain, usable once
///
/// Consumed by [`Next::forward`]. Dropping it without forwarding
/// short-circuits the pipeline.
pub struct Next<'n> {
    remaining: &'n [&'n dyn Policy],
    env: PipelineEnv<'n>,
}

impl<'n> Next<'n> {
    /// Invoke the next policy with the remainder after it
    ///
    /// # Errors
    /// `InvalidArgument` if the chain ends without a terminal policy;
    /// otherwise whatever the next policy reports.
    pub fn forward(self, request: &mut Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        let Some((policy, rest)) = self.remaining.split_first() else {
            return Err(SdkError::invalid_argument("pipeline", "no terminal policy"));
        };
        policy.process(Next { remaining: rest, env: self.env }, request, response)
    }

    /// Turn the token into a handle that may run the remainder repeatedly
    #[must_use]
    pub fn into_attempts(self) -> Attempts<'n> {
        Attempts { remaining: self.remaining, env: self.env }
    }

    #[must_use]
    pub fn clock(&self) -> &'n dyn Clock {
        self.env.clock
    }

    #[must_use]
    pub fn transport(&self) -> &'n dyn Transport {
        self.env.transport
    }

    #[must_use]
    pub fn env(&self) -> PipelineEnv<'n> {
        self.env
    }

    /// Number of policies left, excluding the caller
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

/// Replayable remainder of the chain, produced by [`Next::into_attempts`]
pub struct Attempts<'n> {
    remaining: &'n [&'n dyn Policy],
    env: PipelineEnv<'n>,
}

impl<'n> Attempts<'n> {
    /// Run the remainder once more
    ///
    /// # Errors
    /// Whatever the remainder reports for this attempt.
    pub fn attempt(&self, request: &mut Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        Next { remaining: self.remaining, env: self.env }.forward(request, response)
    }

    #[must_use]
    pub fn clock(&self) -> &'n dyn Clock {
        self.env.clock
    }
}

/// An immutable ordered chain of `N` policies
pub struct Pipeline<'p, const N: usize> {
    policies: [&'p dyn Policy; N],
    env: PipelineEnv<'p>,
}

impl<'p, const N: usize> Pipeline<'p, N> {
    #[must_use]
    pub fn new(
        policies: [&'p dyn Policy; N],
        clock: &'p dyn Clock,
        transport: &'p dyn Transport,
    ) -> Self {
        Self { policies, env: PipelineEnv { clock, transport } }
    }

    /// Run `request` through every policy in order
    ///
    /// # Errors
    /// The first error no policy recovered from.
    pub fn process(&self, request: &mut Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
        Next { remaining: &self.policies, env: self.env }.forward(request, response)
    }

    #[must_use]
    pub fn env(&self) -> PipelineEnv<'p> {
        self.env
    }

    /// Policy names in execution order
    pub fn policy_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.policies.iter().map(|policy| policy.name())
    }
}

impl<const N: usize> fmt::Debug for Pipeline<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.policy_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nimbus_common::time::MockClock;

    use super::*;
    use crate::context::Context;
    use crate::http::Method;
    use crate::testing::ScriptedTransport;

    /// Appends a header, then forwards.
    struct Tagging(&'static str);

    impl Policy for Tagging {
        fn process(
            &self,
            next: Next<'_>,
            request: &mut Request<'_>,
            response: &mut Response<'_>,
        ) -> SdkResult<()> {
            request.append_header("x-tag", self.0)?;
            next.forward(request, response)
        }

        fn name(&self) -> &'static str {
            "tagging"
        }
    }

    /// Answers directly without forwarding.
    struct ShortCircuit(AtomicUsize);

    impl Policy for ShortCircuit {
        fn process(
            &self,
            _next: Next<'_>,
            _request: &mut Request<'_>,
            response: &mut Response<'_>,
        ) -> SdkResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            response.write(b"HTTP/1.1 204 No Content\r\n\r\n")
        }

        fn name(&self) -> &'static str {
            "short_circuit"
        }
    }

    /// Validates policies run in array order and the terminal transport sees
    /// every header appended on the way down.
    #[test]
    fn test_policies_run_in_order() {
        let clock = MockClock::starting_at(1_000);
        let transport = ScriptedTransport::new();
        transport.push_response(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
        let (first, second) = (Tagging("first"), Tagging("second"));
        let terminal = TransportPolicy;
        let pipeline = Pipeline::new([&first, &second, &terminal], &clock, &transport);

        let ctx = Context::root();
        let (mut url, mut headers, mut raw) = ([0u8; 64], [0u8; 128], [0u8; 128]);
        let mut request =
            Request::new(&ctx, Method::Get, "https://a/b", &mut url, &mut headers, b"").unwrap();
        let mut response = Response::new(&mut raw);

        pipeline.process(&mut request, &mut response).unwrap();

        assert_eq!(response.status().unwrap(), 200);
        let sent = transport.request(0).unwrap();
        assert_eq!(sent.headers(), "x-tag: first\r\nx-tag: second\r\n");
        assert_eq!(
            pipeline.policy_names().collect::<Vec<_>>(),
            vec!["tagging", "tagging", "transport"]
        );
    }

    #[test]
    fn test_policy_may_short_circuit() {
        let clock = MockClock::new();
        let transport = ScriptedTransport::new();
        let stop = ShortCircuit(AtomicUsize::new(0));
        let terminal = TransportPolicy;
        let pipeline = Pipeline::new([&stop, &terminal], &clock, &transport);

        let ctx = Context::root();
        let (mut url, mut headers, mut raw) = ([0u8; 32], [0u8; 32], [0u8; 64]);
        let mut request =
            Request::new(&ctx, Method::Get, "https://a", &mut url, &mut headers, b"").unwrap();
        let mut response = Response::new(&mut raw);

        pipeline.process(&mut request, &mut response).unwrap();

        assert_eq!(response.status().unwrap(), 204);
        assert_eq!(transport.request_count(), 0);
        assert_eq!(stop.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chain_without_terminal_policy_fails() {
        let clock = MockClock::new();
        let transport = ScriptedTransport::new();
        let tag = Tagging("only");
        let pipeline = Pipeline::new([&tag], &clock, &transport);

        let ctx = Context::root();
        let (mut url, mut headers, mut raw) = ([0u8; 32], [0u8; 32], [0u8; 32]);
        let mut request =
            Request::new(&ctx, Method::Get, "https://a", &mut url, &mut headers, b"").unwrap();
        let mut response = Response::new(&mut raw);

        let err = pipeline.process(&mut request, &mut response).unwrap_err();
        assert!(matches!(err, SdkError::InvalidArgument { field: "pipeline", .. }));
    }
}
