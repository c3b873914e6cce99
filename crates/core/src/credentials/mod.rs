//! Credentials and the policy that applies them
//!
//! A [`Credential`] decides what, if anything, a request needs to be
//! authenticated and appends it before forwarding. [`CredentialPolicy`]
//! places any credential into a pipeline.

pub mod aad;
mod anonymous;
mod client_secret;
pub mod token;

pub use anonymous::AnonymousCredential;
pub use client_secret::ClientSecretCredential;
pub use token::{TokenCache, TOKEN_CAPACITY};

use std::fmt;

use nimbus_common::error::SdkResult;

use crate::http::{Request, Response};
use crate::pipeline::{Next, Policy};

/// Capability set shared by every credential
pub trait Credential<'a>: Send + Sync {
    /// Authenticate `request`, then forward it exactly once
    ///
    /// # Errors
    /// Token acquisition failures, header overflow, or whatever the remainder
    /// of the chain reports.
    fn apply_policy(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()>;

    /// Replace the scopes requested for future tokens
    ///
    /// # Errors
    /// Credential-specific validation failures.
    fn set_scopes(&mut self, scopes: &'a str) -> SdkResult<()>;
}

/// Pipeline step delegating to a credential
#[derive(Clone, Copy)]
pub struct CredentialPolicy<'c, 'a> {
    credential: &'c dyn Credential<'a>,
}

impl<'c, 'a> CredentialPolicy<'c, 'a> {
    #[must_use]
    pub fn new(credential: &'c dyn Credential<'a>) -> Self {
        Self { credential }
    }
}

impl Policy for CredentialPolicy<'_, '_> {
    fn process(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        self.credential.apply_policy(next, request, response)
    }

    fn name(&self) -> &'static str {
        "credential"
    }
}

impl fmt::Debug for CredentialPolicy<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPolicy").finish_non_exhaustive()
    }
}
