//! Infrastructure error type and conversions from external crates

use nimbus_common::error::{SdkError, TransportErrorKind};
use thiserror::Error;

/// Errors raised while wiring the SDK up, before any request runs
#[derive(Debug, Error)]
pub enum InfraError {
    /// Configuration is missing, unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The subscriber could not be installed
    #[error("Logging initialisation failed: {0}")]
    Logging(String),

    /// An SDK-level validation failure surfaced during setup
    #[error(transparent)]
    Sdk(#[from] SdkError),
}

/// Result alias for infrastructure operations
pub type InfraResult<T> = Result<T, InfraError>;

/// Classify a `reqwest` failure into the SDK transport taxonomy
///
/// The message is a static label; the full `reqwest` error is logged by the
/// caller instead of being carried through the request path.
#[must_use]
pub fn transport_error(err: &reqwest::Error) -> SdkError {
    if err.is_timeout() {
        return SdkError::transport(TransportErrorKind::Timeout, "HTTP request timed out");
    }

    if err.is_connect() {
        return SdkError::transport(TransportErrorKind::Connect, "HTTP connection failure");
    }

    if err.is_body() || err.is_decode() {
        return SdkError::transport(TransportErrorKind::Io, "failed to read HTTP body");
    }

    if err.is_request() || err.is_builder() {
        return SdkError::transport(TransportErrorKind::Protocol, "HTTP request rejected");
    }

    SdkError::transport(TransportErrorKind::Other, "HTTP transport failure")
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use nimbus_common::ErrorClassification;

    use super::*;

    #[test]
    fn connection_refused_maps_to_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED

        let client =
            reqwest::blocking::Client::builder().timeout(Duration::from_secs(2)).build().unwrap();
        let err = client.get(format!("http://{addr}")).send().unwrap_err();

        let mapped = transport_error(&err);
        assert!(matches!(mapped, SdkError::Transport { kind: TransportErrorKind::Connect, .. }));
        assert!(mapped.is_retryable());
    }

    #[test]
    fn sdk_errors_convert_transparently() {
        let infra: InfraError = SdkError::invalid_argument("tenant_id", "must not be empty").into();
        assert!(matches!(infra, InfraError::Sdk(SdkError::InvalidArgument { .. })));
        assert!(infra.to_string().contains("tenant_id"));
    }

    #[test]
    fn config_error_display() {
        let err = InfraError::Config("missing tenant".into());
        assert_eq!(err.to_string(), "Configuration error: missing tenant");
    }
}
