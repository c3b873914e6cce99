//! # Nimbus Core
//!
//! Transport-and-trust layer of the nimbus client: everything between "the
//! caller has a URL" and "bytes leave through a transport".
//!
//! This crate contains:
//! - [`context`]: cancellation and deadline tree
//! - [`http`]: requests and responses over caller-owned buffers
//! - [`pipeline`]: the policy chain (retry, credential, transport, ...)
//! - [`credentials`]: client-secret and anonymous credentials
//!
//! ## Architecture Principles
//! - Only depends on `nimbus-common` plus serialization and tracing crates
//! - No allocation on the request path: buffers belong to the caller
//! - Time and I/O come in through the `Clock` and `Transport` traits
//!
//! ## Example
//!
//! ```
//! use nimbus_common::time::MockClock;
//! use nimbus_core::context::Context;
//! use nimbus_core::http::{Method, Request, Response};
//! use nimbus_core::pipeline::{Pipeline, RetryPolicy, Transport, TransportPolicy};
//! use nimbus_core::SdkResult;
//!
//! struct Echo;
//!
//! impl Transport for Echo {
//!     fn send(&self, _request: &Request<'_>, response: &mut Response<'_>) -> SdkResult<()> {
//!         response.write(b"HTTP/1.1 204 No Content\r\n\r\n")
//!     }
//! }
//!
//! let clock = MockClock::new();
//! let retry = RetryPolicy::default();
//! let transport_policy = TransportPolicy;
//! let pipeline = Pipeline::new([&retry, &transport_policy], &clock, &Echo);
//!
//! let (mut url, mut headers, mut raw) = ([0u8; 64], [0u8; 256], [0u8; 512]);
//! let context = Context::with_expiration(None, i64::MAX);
//! let mut request =
//!     Request::new(&context, Method::Get, "https://example.com/data", &mut url, &mut headers, b"")?;
//! let mut response = Response::new(&mut raw);
//!
//! pipeline.process(&mut request, &mut response)?;
//! assert_eq!(response.status()?, 204);
//! # Ok::<(), nimbus_core::SdkError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod context;
pub mod credentials;
pub mod http;
pub mod pipeline;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use context::{Context, ContextKey};
pub use credentials::{AnonymousCredential, ClientSecretCredential, Credential, CredentialPolicy};
pub use http::{Method, Request, Response};
pub use nimbus_common::error::{SdkError, SdkResult};
pub use pipeline::{Pipeline, Policy, RetryOptions, RetryPolicy, Transport, TransportPolicy};
