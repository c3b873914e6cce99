//! Shared test helpers for `nimbus-core` integration tests.
//!
//! Canned wire responses plus a helper that runs one request through a
//! pipeline with stack buffers, so tests can focus on behaviour instead of
//! buffer plumbing.

#![allow(dead_code)]

use nimbus_core::context::Context;
use nimbus_core::http::{Method, Request, Response};
use nimbus_core::{Pipeline, SdkResult};

pub const TENANT_ID: &str = "TenantID";
pub const CLIENT_ID: &str = "ClientID";
pub const CLIENT_SECRET: &str = "ClientSecret";
pub const SCOPES: &str = "https://storage.azure.com/.default";

pub const TARGET_URL: &str = "https://example.com/data";
pub const TOKEN_URL: &str = "https://login.microsoftonline.com/TenantID/oauth2/v2.0/token";

pub const OK_EMPTY: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";

/// A 200 response from the token endpoint
pub fn token_response(access_token: &str, expires_in: i64) -> Vec<u8> {
    let body = format!(r#"{{ "access_token" : "{access_token}", "expires_in" : {expires_in} }}"#);
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

/// A response with an empty body
pub fn status_response(status: u16, reason: &str) -> Vec<u8> {
    format!("HTTP/1.1 {status} {reason}\r\nContent-Length: 0\r\n\r\n").into_bytes()
}

/// Run a GET for `url` and return the final status
pub fn get<const N: usize>(
    pipeline: &Pipeline<'_, N>,
    context: &Context<'_>,
    url: &str,
) -> SdkResult<u16> {
    let mut url_buffer = [0u8; 256];
    let mut header_buffer = [0u8; 2_560];
    let mut raw = [0u8; 1_024];
    let mut request =
        Request::new(context, Method::Get, url, &mut url_buffer, &mut header_buffer, b"")?;
    let mut response = Response::new(&mut raw);
    pipeline.process(&mut request, &mut response)?;
    response.status()
}
