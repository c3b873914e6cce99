//! Retry policy with exponential backoff and server-provided delay hints
//!
//! The policy replays the rest of the chain when an attempt fails with a
//! transient error or answers with a retriable status. Between attempts it
//! resets the response buffer and drops headers appended by later policies,
//! so every attempt starts from the request the retry policy first saw.
//!
//! Waits go through the pipeline's [`Clock`](nimbus_common::time::Clock) and
//! the request context is checked on both sides of every wait.

use nimbus_common::error::{ErrorClassification, SdkError, SdkResult, DEFAULT_RETRIABLE_STATUSES};
use rand::Rng;
use tracing::{debug, warn};

use super::{Next, Policy};
use crate::http::{
    Request, Response, HEADER_RETRY_AFTER, HEADER_RETRY_AFTER_MS, HEADER_X_MS_RETRY_AFTER_MS,
};

/// Most status codes a [`RetryOptions`] can hold
pub const MAX_RETRY_STATUSES: usize = 16;

/// Upper bound on `max_retries`
pub const MAX_RETRIES_LIMIT: u16 = 10;

/// Jitter applied to computed backoff delays
///
/// Server-provided delays are never jittered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Use the computed delay as-is
    #[default]
    None,
    /// Anywhere between 0 and the computed delay
    Full,
    /// Between half the computed delay and the computed delay
    Equal,
}

impl Jitter {
    /// Apply jitter to `delay_msec`
    #[must_use]
    pub fn apply(self, delay_msec: i64) -> i64 {
        if delay_msec <= 0 {
            return 0;
        }
        let mut rng = rand::thread_rng();
        match self {
            Self::None => delay_msec,
            Self::Full => rng.gen_range(0..=delay_msec),
            Self::Equal => {
                let half = delay_msec / 2;
                half + rng.gen_range(0..=delay_msec - half)
            }
        }
    }
}

/// Decision for whether to run another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the computed backoff delay, then retry
    Retry,
    /// Wait for a delay the server asked for, then retry
    RetryAfter(i64),
    /// Return the current outcome
    Stop,
}

/// Configuration for [`RetryPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Additional attempts after the first one
    pub max_retries: u16,
    /// Base delay of the exponential backoff
    pub retry_delay_msec: i64,
    /// Cap on any single wait, computed or server-provided
    pub max_retry_delay_msec: i64,
    /// Response statuses worth another attempt
    pub status_codes: heapless::Vec<u16, MAX_RETRY_STATUSES>,
    pub jitter: Jitter,
}

impl Default for RetryOptions {
    fn default() -> Self {
        let mut status_codes = heapless::Vec::new();
        for status in DEFAULT_RETRIABLE_STATUSES {
            // Six defaults always fit in sixteen slots.
            let _ = status_codes.push(*status);
        }
        Self {
            max_retries: 4,
            retry_delay_msec: 4_000,
            max_retry_delay_msec: 120_000,
            status_codes,
            jitter: Jitter::None,
        }
    }
}

impl RetryOptions {
    /// Replace the retriable status set
    ///
    /// # Errors
    /// `BufferTooSmall` when more than [`MAX_RETRY_STATUSES`] codes are given.
    pub fn with_status_codes(mut self, codes: &[u16]) -> SdkResult<Self> {
        self.status_codes = heapless::Vec::from_slice(codes).map_err(|()| {
            SdkError::buffer_too_small("retry status codes", codes.len(), MAX_RETRY_STATUSES)
        })?;
        Ok(self)
    }

    /// Check the options are usable
    ///
    /// # Errors
    /// `InvalidArgument` naming the first offending field.
    pub fn validate(&self) -> SdkResult<()> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(SdkError::invalid_argument("max_retries", "must be at most 10"));
        }
        if self.retry_delay_msec <= 0 {
            return Err(SdkError::invalid_argument("retry_delay_msec", "must be positive"));
        }
        if self.max_retry_delay_msec < self.retry_delay_msec {
            return Err(SdkError::invalid_argument(
                "max_retry_delay_msec",
                "must not be below retry_delay_msec",
            ));
        }
        Ok(())
    }

    /// Whether `status` is in the retriable set
    #[must_use]
    pub fn is_retriable_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    /// Exponential backoff for the zero-based retry `attempt`, before jitter
    #[must_use]
    pub fn backoff_msec(&self, attempt: u16) -> i64 {
        let factor = 1_i64 << u32::from(attempt.min(30));
        self.retry_delay_msec.saturating_mul(factor).min(self.max_retry_delay_msec)
    }
}

/// Replays the remainder of the chain on transient failures
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    options: RetryOptions,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Classify the outcome of one attempt
    ///
    /// A server delay hint in `response` is honoured both for replies and for
    /// status errors raised by an inner policy.
    #[must_use]
    pub fn decide(&self, outcome: &SdkResult<()>, response: &Response<'_>) -> RetryDecision {
        match outcome {
            Err(SdkError::Status { status }) if self.options.is_retriable_status(*status) => {
                server_delay_msec(response).map_or(RetryDecision::Retry, RetryDecision::RetryAfter)
            }
            Err(SdkError::Status { .. }) => RetryDecision::Stop,
            Err(error) if error.is_retryable() => RetryDecision::Retry,
            Err(_) => RetryDecision::Stop,
            Ok(()) => match response.status() {
                Ok(status) if self.options.is_retriable_status(status) => {
                    server_delay_msec(response)
                        .map_or(RetryDecision::Retry, RetryDecision::RetryAfter)
                }
                _ => RetryDecision::Stop,
            },
        }
    }

    fn delay_msec(&self, decision: RetryDecision, attempt: u16) -> i64 {
        match decision {
            RetryDecision::RetryAfter(msec) => msec.clamp(0, self.options.max_retry_delay_msec),
            _ => self.options.jitter.apply(self.options.backoff_msec(attempt)),
        }
    }
}

impl Policy for RetryPolicy {
    fn process(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        let context = request.context();
        let attempts = next.into_attempts();
        let clock = attempts.clock();
        request.mark_retry_headers();

        let mut retry: u16 = 0;
        loop {
            response.reset();
            request.remove_retry_headers();
            let outcome = attempts.attempt(request, response);

            let decision = self.decide(&outcome, response);
            if decision == RetryDecision::Stop {
                return outcome;
            }
            if retry >= self.options.max_retries {
                debug!(attempts = retry + 1, url = %request.url(), "retries exhausted");
                return outcome;
            }

            if context.has_expired(clock.now_msec()) {
                return Err(SdkError::Cancelled);
            }
            let delay_msec = self.delay_msec(decision, retry);
            warn!(
                attempt = retry + 1,
                delay_msec,
                status = response.status().ok(),
                error = outcome.err().map(|e| e.label()),
                "retrying request"
            );
            clock.sleep_msec(delay_msec);
            if context.has_expired(clock.now_msec()) {
                return Err(SdkError::Cancelled);
            }
            retry += 1;
        }
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}

/// Delay requested by the server, in milliseconds
fn server_delay_msec(response: &Response<'_>) -> Option<i64> {
    let parse = |value: &str| value.trim().parse::<i64>().ok().filter(|v| *v >= 0);

    [HEADER_RETRY_AFTER_MS, HEADER_X_MS_RETRY_AFTER_MS]
        .into_iter()
        .find_map(|name| response.header(name).and_then(parse))
        .or_else(|| {
            response.header(HEADER_RETRY_AFTER).and_then(parse).map(|s| s.saturating_mul(1_000))
        })
}
