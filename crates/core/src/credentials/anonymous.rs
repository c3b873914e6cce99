//! Credential for endpoints that need no authentication

use nimbus_common::error::SdkResult;

use super::Credential;
use crate::http::{Request, Response};
use crate::pipeline::Next;

/// Adds nothing to the request
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousCredential;

impl<'a> Credential<'a> for AnonymousCredential {
    fn apply_policy(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        next.forward(request, response)
    }

    fn set_scopes(&mut self, _scopes: &'a str) -> SdkResult<()> {
        Ok(())
    }
}
