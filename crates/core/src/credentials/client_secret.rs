//! OAuth2 client-credentials flow against Azure Active Directory

use std::fmt;

use nimbus_common::error::{SdkError, SdkResult};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::aad::{
    self, AAD_REQUEST_HEADER_CAPACITY, AAD_REQUEST_URL_CAPACITY, AAD_RESPONSE_CAPACITY,
    DEFAULT_AUTHORITY,
};
use super::token::TokenCache;
use super::Credential;
use crate::context::Context;
use crate::http::{
    self, Method, Request, Response, CONTENT_TYPE_FORM, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE,
};
use crate::pipeline::{Next, Pipeline, PipelineEnv, TransportPolicy};

/// Credential exchanging a client id and secret for bearer tokens
///
/// Tokens are cached until they expire. The cache lock is held while a token
/// is checked, refreshed and stored, so concurrent pipelines sharing one
/// credential issue a single token request.
pub struct ClientSecretCredential<'a> {
    tenant_id: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    authority: &'a str,
    scopes: &'a str,
    token: Mutex<TokenCache>,
}

impl<'a> ClientSecretCredential<'a> {
    /// Create a credential; `None` or an empty authority selects
    /// [`DEFAULT_AUTHORITY`]
    ///
    /// # Errors
    /// `InvalidArgument` when the tenant id, client id or secret is empty.
    pub fn new(
        tenant_id: &'a str,
        client_id: &'a str,
        client_secret: &'a str,
        authority: Option<&'a str>,
    ) -> SdkResult<Self> {
        if tenant_id.is_empty() {
            return Err(SdkError::invalid_argument("tenant_id", "must not be empty"));
        }
        if client_id.is_empty() {
            return Err(SdkError::invalid_argument("client_id", "must not be empty"));
        }
        if client_secret.is_empty() {
            return Err(SdkError::invalid_argument("client_secret", "must not be empty"));
        }

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            authority: authority.filter(|a| !a.is_empty()).unwrap_or(DEFAULT_AUTHORITY),
            scopes: "",
            token: Mutex::new(TokenCache::new()),
        })
    }

    #[must_use]
    pub const fn tenant_id(&self) -> &'a str {
        self.tenant_id
    }

    #[must_use]
    pub const fn client_id(&self) -> &'a str {
        self.client_id
    }

    #[must_use]
    pub const fn authority(&self) -> &'a str {
        self.authority
    }

    #[must_use]
    pub const fn scopes(&self) -> &'a str {
        self.scopes
    }

    /// Expiry of the cached token (0 when none was acquired)
    #[must_use]
    pub fn token_expiry_msec(&self) -> i64 {
        self.token.lock().expiry_msec()
    }

    /// Drop the cached token; the next request acquires a new one
    pub fn invalidate_token(&self) {
        self.token.lock().invalidate();
    }

    /// Run the token exchange and store the result in `cache`
    ///
    /// A rejected exchange leaves the token endpoint's status line and headers
    /// in `outer` so an enclosing retry policy can honour its delay hint.
    fn refresh(
        &self,
        cache: &mut TokenCache,
        now_msec: i64,
        env: PipelineEnv<'_>,
        context: &Context<'_>,
        outer: &mut Response<'_>,
    ) -> SdkResult<()> {
        let url = aad::token_url(self.authority, self.tenant_id)?;
        let body = aad::token_body(self.client_id, self.scopes, self.client_secret)?;

        let mut url_buffer = [0u8; AAD_REQUEST_URL_CAPACITY];
        let mut header_buffer = [0u8; AAD_REQUEST_HEADER_CAPACITY];
        let mut response_buffer = [0u8; AAD_RESPONSE_CAPACITY];

        let mut request = Request::new(
            context,
            Method::Post,
            &url,
            &mut url_buffer,
            &mut header_buffer,
            body.as_bytes(),
        )?;
        request.append_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_FORM)?;
        let mut response = Response::new(&mut response_buffer);

        let terminal = TransportPolicy;
        let pipeline = Pipeline::new([&terminal], env.clock, env.transport);
        pipeline.process(&mut request, &mut response)?;

        let status = response.status()?;
        if !http::is_success(status) {
            warn!(status, tenant_id = self.tenant_id, "token request rejected");
            copy_head(&response, outer);
            return Err(SdkError::Status { status });
        }

        let token = aad::parse_token_response(response.body()?)?;
        let expiry_msec = now_msec.saturating_add(token.expires_in.saturating_mul(1_000));
        cache.store(token.access_token, expiry_msec)?;
        info!(
            tenant_id = self.tenant_id,
            expires_in = token.expires_in,
            expiry_msec,
            "acquired access token"
        );
        Ok(())
    }
}

impl<'a> Credential<'a> for ClientSecretCredential<'a> {
    fn apply_policy(
        &self,
        next: Next<'_>,
        request: &mut Request<'_>,
        response: &mut Response<'_>,
    ) -> SdkResult<()> {
        {
            let mut cache = self.token.lock();
            let now_msec = next.clock().now_msec();
            if cache.is_valid(now_msec) {
                debug!(expiry_msec = cache.expiry_msec(), "reusing cached access token");
            } else {
                self.refresh(&mut cache, now_msec, next.env(), request.context(), response)?;
            }
            request.append_header(HEADER_AUTHORIZATION, cache.header_value())?;
        }
        next.forward(request, response)
    }

    fn set_scopes(&mut self, scopes: &'a str) -> SdkResult<()> {
        self.scopes = scopes;
        Ok(())
    }
}

/// Replace `outer` with the status line and headers of `reply`
fn copy_head(reply: &Response<'_>, outer: &mut Response<'_>) {
    let head_len = reply.len() - reply.body().map_or(0, <[u8]>::len);
    outer.reset();
    if outer.write(&reply.as_bytes()[..head_len]).is_err() {
        debug!(head_len, "token reply head does not fit the caller's response");
        outer.reset();
    }
}

impl fmt::Debug for ClientSecretCredential<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authority", &self.authority)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
