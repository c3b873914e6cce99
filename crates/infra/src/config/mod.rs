//! Configuration loading and management
//!
//! This module provides the settings an application needs to assemble a
//! pipeline: the client-secret credential inputs and the retry options.
//! Values are owned `String`s; the SDK types built from them borrow.

pub mod loader;

use std::fmt;

use nimbus_common::error::SdkResult;
use nimbus_core::credentials::Credential;
use nimbus_core::pipeline::{Jitter, RetryOptions};
use nimbus_core::ClientSecretCredential;
use serde::Deserialize;

use crate::errors::InfraResult;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, parse_config, probe_config_paths};

/// Top-level configuration document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NimbusConfig {
    pub credential: CredentialConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl NimbusConfig {
    /// Check every section can be turned into SDK types
    ///
    /// # Errors
    /// `InfraError::Sdk` carrying the first invalid field.
    pub fn validate(&self) -> InfraResult<()> {
        self.credential.credential()?;
        self.retry.options()?;
        Ok(())
    }
}

/// Inputs of the OAuth2 client-credentials exchange
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Authority host; `None` selects the public cloud
    #[serde(default)]
    pub authority: Option<String>,
    /// Space-separated scopes requested for the token
    #[serde(default)]
    pub scopes: String,
}

impl CredentialConfig {
    /// Build a credential borrowing this configuration
    ///
    /// # Errors
    /// `InvalidArgument` when a required field is empty.
    pub fn credential(&self) -> SdkResult<ClientSecretCredential<'_>> {
        let mut credential = ClientSecretCredential::new(
            &self.tenant_id,
            &self.client_id,
            &self.client_secret,
            self.authority.as_deref(),
        )?;
        if !self.scopes.is_empty() {
            credential.set_scopes(&self.scopes)?;
        }
        Ok(credential)
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authority", &self.authority)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Jitter applied to computed backoff delays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    #[default]
    None,
    Full,
    Equal,
}

impl From<JitterMode> for Jitter {
    fn from(mode: JitterMode) -> Self {
        match mode {
            JitterMode::None => Self::None,
            JitterMode::Full => Self::Full,
            JitterMode::Equal => Self::Equal,
        }
    }
}

/// Retry settings; every field is optional in files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u16,
    pub retry_delay_msec: i64,
    pub max_retry_delay_msec: i64,
    pub status_codes: Vec<u16>,
    pub jitter: JitterMode,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let defaults = RetryOptions::default();
        Self {
            max_retries: defaults.max_retries,
            retry_delay_msec: defaults.retry_delay_msec,
            max_retry_delay_msec: defaults.max_retry_delay_msec,
            status_codes: defaults.status_codes.to_vec(),
            jitter: JitterMode::None,
        }
    }
}

impl RetryConfig {
    /// Build validated retry options
    ///
    /// # Errors
    /// `InvalidArgument` for out-of-range values, `BufferTooSmall` for too
    /// many status codes.
    pub fn options(&self) -> SdkResult<RetryOptions> {
        let options = RetryOptions {
            max_retries: self.max_retries,
            retry_delay_msec: self.retry_delay_msec,
            max_retry_delay_msec: self.max_retry_delay_msec,
            jitter: self.jitter.into(),
            ..RetryOptions::default()
        }
        .with_status_codes(&self.status_codes)?;
        options.validate()?;
        Ok(options)
    }
}
