//! # Nimbus Infrastructure
//!
//! The impure edges around `nimbus-core`:
//! - Configuration loading from the environment or TOML/JSON files
//! - A blocking `reqwest` implementation of the core `Transport` trait
//! - `tracing-subscriber` initialisation
//!
//! ## Architecture
//! - Implements traits defined in `nimbus-core`
//! - Contains all I/O; nothing here runs on the non-allocating request path
//!   except [`http::ReqwestTransport::send`], which necessarily talks to the
//!   network

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use config::{CredentialConfig, NimbusConfig, RetryConfig};
pub use errors::{InfraError, InfraResult};
pub use http::ReqwestTransport;
