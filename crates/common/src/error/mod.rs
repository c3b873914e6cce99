//! Error taxonomy shared by every nimbus crate
//!
//! Every fallible operation on the request path returns [`SdkResult`]. The
//! variants carry only `'static` context and plain integers, so producing an
//! error never touches the heap and errors are `Copy`.
//!
//! # Error Handling Architecture
//!
//! 1. **`SdkError`**: the closed set of outcomes a pipeline, context or
//!    credential operation can report.
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by their characteristics (retryability, severity, criticality).
//!    The retry policy consults it; nothing else converts an error into
//!    another attempt.
//! 3. **`ErrorSeverity` enum**: a unified severity level used when errors are
//!    logged.
//!
//! ## Standard Error Patterns
//!
//! | Pattern | Variant | When to Use |
//! |---------|---------|-------------|
//! | **Lookup** | `NotFound` | Context key has no binding in the ancestor chain |
//! | **Preconditions** | `InvalidArgument` | Empty/invalid inputs at construction |
//! | **Capacity** | `BufferTooSmall` | A fixed-capacity region would overflow |
//! | **Parsing** | `MalformedResponse` | Raw HTTP or token JSON cannot be read |
//! | **HTTP status** | `Status` | Non-2xx from the token endpoint |
//! | **Network** | `Transport` | Failure reported by the transport |
//! | **Deadlines** | `Cancelled` | The governing context expired |
//!
//! ## Module-specific errors
//!
//! Crates that need heap-carrying diagnostics (configuration loading, for
//! instance) define their own error enum and embed `SdkError`:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum InfraError {
//!     #[error("Configuration error: {0}")]
//!     Config(String),
//!
//!     #[error(transparent)]
//!     Sdk(#[from] SdkError),
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// Standard result type using [`SdkError`]
pub type SdkResult<T> = Result<T, SdkError>;

/// HTTP status codes that are worth another attempt by default.
pub const DEFAULT_RETRIABLE_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504];

/// Coarse classification of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The connection could not be established
    Connect,
    /// The peer did not answer in time
    Timeout,
    /// Reading or writing the socket failed mid-exchange
    Io,
    /// The peer spoke something that is not HTTP/1.1
    Protocol,
    /// Anything the transport could not classify
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Outcomes reported by context, pipeline and credential operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SdkError {
    /// No node in the context chain carries the requested key
    #[error("no context binding found for key '{key}'")]
    NotFound { key: &'static str },

    /// A required input was missing or invalid at construction time
    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: &'static str },

    /// A fixed-capacity buffer would overflow; nothing was written
    #[error("buffer '{buffer}' too small: {required} bytes required, {capacity} available")]
    BufferTooSmall { buffer: &'static str, required: usize, capacity: usize },

    /// A response could not be parsed or lacks required fields
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: &'static str },

    /// The token endpoint (or a policy inspecting a response) saw a non-2xx
    /// status
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    /// The transport failed to exchange bytes with the peer
    #[error("transport failure ({kind}): {message}")]
    Transport { kind: TransportErrorKind, message: &'static str },

    /// The governing context expired before the operation could finish
    #[error("operation cancelled: context expired")]
    Cancelled,
}

impl SdkError {
    /// Create a buffer overflow error
    #[must_use]
    pub const fn buffer_too_small(buffer: &'static str, required: usize, capacity: usize) -> Self {
        Self::BufferTooSmall { buffer, required, capacity }
    }

    /// Create an invalid argument error
    #[must_use]
    pub const fn invalid_argument(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidArgument { field, reason }
    }

    /// Create a malformed response error
    #[must_use]
    pub const fn malformed(reason: &'static str) -> Self {
        Self::MalformedResponse { reason }
    }

    /// Create a transport error
    #[must_use]
    pub const fn transport(kind: TransportErrorKind, message: &'static str) -> Self {
        Self::Transport { kind, message }
    }

    /// Whether this is a 401/403 from the service
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403 })
    }

    /// Stable label suitable for structured log fields
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::BufferTooSmall { .. } => "buffer_too_small",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Status { .. } => "status",
            Self::Transport { .. } => "transport",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Standard interface for classifying errors
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: network failures and the HTTP statuses
    /// listed in [`DEFAULT_RETRIABLE_STATUSES`].
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;
}

impl ErrorClassification for SdkError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status } => DEFAULT_RETRIABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } | Self::Cancelled => ErrorSeverity::Info,
            Self::Transport { .. } => ErrorSeverity::Warning,
            Self::Status { status } if *status >= 500 => ErrorSeverity::Warning,
            Self::Status { .. } | Self::InvalidArgument { .. } | Self::MalformedResponse { .. } => {
                ErrorSeverity::Error
            }
            Self::BufferTooSmall { .. } => ErrorSeverity::Critical,
        }
    }

    /// Buffer overflows mean compile-time capacities are wrong for the
    /// deployment, which no retry can fix.
    fn is_critical(&self) -> bool {
        matches!(self, Self::BufferTooSmall { .. })
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the error taxonomy.

    use super::*;

    /// Validates `SdkError::is_retryable` across the taxonomy.
    ///
    /// Assertions:
    /// - Transport failures and default retriable statuses are retryable.
    /// - Client errors, parsing failures and cancellation are not.
    #[test]
    fn test_retry_classification() {
        assert!(SdkError::transport(TransportErrorKind::Timeout, "slow peer").is_retryable());
        assert!(SdkError::Status { status: 500 }.is_retryable());
        assert!(SdkError::Status { status: 429 }.is_retryable());

        assert!(!SdkError::Status { status: 400 }.is_retryable());
        assert!(!SdkError::Status { status: 401 }.is_retryable());
        assert!(!SdkError::malformed("not json").is_retryable());
        assert!(!SdkError::Cancelled.is_retryable());
        assert!(!SdkError::buffer_too_small("headers", 40, 16).is_retryable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);

        assert_eq!(SdkError::Cancelled.severity(), ErrorSeverity::Info);
        assert_eq!(SdkError::Status { status: 503 }.severity(), ErrorSeverity::Warning);
        assert_eq!(SdkError::Status { status: 404 }.severity(), ErrorSeverity::Error);
        assert!(SdkError::buffer_too_small("url", 300, 256).is_critical());
    }

    #[test]
    fn test_display_messages() {
        let err = SdkError::buffer_too_small("request headers", 42, 16);
        assert_eq!(
            err.to_string(),
            "buffer 'request headers' too small: 42 bytes required, 16 available"
        );

        let err = SdkError::transport(TransportErrorKind::Connect, "connection refused");
        assert_eq!(err.to_string(), "transport failure (connect): connection refused");
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_unauthorized_and_labels() {
        assert!(SdkError::Status { status: 401 }.is_unauthorized());
        assert!(SdkError::Status { status: 403 }.is_unauthorized());
        assert!(!SdkError::Status { status: 500 }.is_unauthorized());

        assert_eq!(SdkError::Cancelled.label(), "cancelled");
        assert_eq!(SdkError::NotFound { key: "tenant" }.label(), "not_found");
    }
}
