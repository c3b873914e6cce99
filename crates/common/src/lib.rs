//! Shared foundations for the nimbus crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: the error taxonomy and its classification trait
//! - `runtime`: clock abstraction (`SystemClock`, `MockClock`)
//! - `observability`: tracing events emitted by runtime helpers

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity, SdkError, SdkResult, TransportErrorKind};
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SystemClock, NEVER_EXPIRES};
