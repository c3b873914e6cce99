//! Tracing subscriber initialisation
//!
//! Installs a `fmt` layer filtered by `NIMBUS_LOG` (falling back to the
//! configured level). Credentials never reach the log: the core policies only
//! record header counts, statuses and expiry timestamps.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::errors::{InfraError, InfraResult};

/// Environment variable holding the filter directives
pub const LOG_ENV_VAR: &str = "NIMBUS_LOG";

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter used when `NIMBUS_LOG` is unset, e.g. `info` or `nimbus_core=debug`
    pub level: String,
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Build the filter from `NIMBUS_LOG` or the configured level
///
/// # Errors
/// `InfraError::Logging` when the directives do not parse.
pub fn env_filter(options: &LoggingOptions) -> InfraResult<EnvFilter> {
    let directives = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| options.level.clone());
    EnvFilter::try_new(&directives)
        .map_err(|e| InfraError::Logging(format!("invalid filter '{directives}': {e}")))
}

/// Install the global subscriber
///
/// Returns `Ok(false)` without touching anything when a global subscriber is
/// already set, so tests and embedding applications may call it repeatedly.
///
/// # Errors
/// `InfraError::Logging` when the filter directives are invalid.
pub fn init(options: &LoggingOptions) -> InfraResult<bool> {
    let filter = env_filter(options)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if options.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
            .is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    if installed {
        tracing::debug!(json = options.json, "tracing subscriber installed");
    }
    Ok(installed)
}
