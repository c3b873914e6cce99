//! Configuration loader
//!
//! Loads SDK configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `NIMBUS_TENANT_ID`: Directory (tenant) id (required)
//! - `NIMBUS_CLIENT_ID`: Application (client) id (required)
//! - `NIMBUS_CLIENT_SECRET`: Client secret (required)
//! - `NIMBUS_AUTHORITY`: Authority host, defaults to the public cloud
//! - `NIMBUS_SCOPES`: Space-separated token scopes
//! - `NIMBUS_RETRY_MAX`: Retries after the first attempt
//! - `NIMBUS_RETRY_DELAY_MS`: Base backoff delay in milliseconds
//! - `NIMBUS_RETRY_MAX_DELAY_MS`: Cap on any single wait in milliseconds
//! - `NIMBUS_RETRY_STATUS_CODES`: Comma-separated retriable statuses
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./nimbus.toml` or `./nimbus.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{CredentialConfig, NimbusConfig, RetryConfig};
use crate::errors::{InfraError, InfraResult};

const FILE_NAMES: [&str; 4] = ["nimbus.toml", "nimbus.json", "config.toml", "config.json"];
const PARENT_PREFIXES: [&str; 3] = ["", "..", "../.."];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `InfraError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
///
/// Returns `InfraError::Sdk` if the values are present but invalid.
pub fn load() -> InfraResult<NimbusConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The three credential variables are required; retry variables fall back
/// to the defaults.
///
/// # Errors
/// Returns `InfraError::Config` if required variables are missing or have
/// invalid values, `InfraError::Sdk` if validation fails.
pub fn load_from_env() -> InfraResult<NimbusConfig> {
    let credential = CredentialConfig {
        tenant_id: env_var("NIMBUS_TENANT_ID")?,
        client_id: env_var("NIMBUS_CLIENT_ID")?,
        client_secret: env_var("NIMBUS_CLIENT_SECRET")?,
        authority: std::env::var("NIMBUS_AUTHORITY").ok().filter(|a| !a.is_empty()),
        scopes: std::env::var("NIMBUS_SCOPES").unwrap_or_default(),
    };

    let defaults = RetryConfig::default();
    let status_codes = match std::env::var("NIMBUS_RETRY_STATUS_CODES") {
        Ok(list) => parse_status_list(&list)?,
        Err(_) => defaults.status_codes.clone(),
    };
    let retry = RetryConfig {
        max_retries: env_parse("NIMBUS_RETRY_MAX", defaults.max_retries)?,
        retry_delay_msec: env_parse("NIMBUS_RETRY_DELAY_MS", defaults.retry_delay_msec)?,
        max_retry_delay_msec: env_parse(
            "NIMBUS_RETRY_MAX_DELAY_MS",
            defaults.max_retry_delay_msec,
        )?,
        status_codes,
        jitter: defaults.jitter,
    };

    let config = NimbusConfig { credential, retry };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `InfraError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> InfraResult<NimbusConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(InfraError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            InfraError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| InfraError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`); a path without
/// an extension is read as JSON.
///
/// # Errors
/// Returns `InfraError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> InfraResult<NimbusConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(InfraError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its two nearest ancestors, then
/// the same locations relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    let candidates: Vec<PathBuf> = roots.iter().flat_map(|root| candidates_under(root)).collect();
    candidates.into_iter().find(|path| path.exists())
}

fn candidates_under(root: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    PARENT_PREFIXES
        .iter()
        .flat_map(move |prefix| FILE_NAMES.iter().map(move |name| root.join(prefix).join(name)))
}

/// Get required environment variable
///
/// # Errors
/// Returns `InfraError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> InfraResult<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty()).ok_or_else(|| {
        InfraError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `InfraError::Config` when the variable is set but not a number.
fn env_parse<T>(key: &str, default: T) -> InfraResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| InfraError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_status_list(list: &str) -> InfraResult<Vec<u16>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .map_err(|e| InfraError::Config(format!("Invalid retry status code '{s}': {e}")))
        })
        .collect()
}
