//! Azure Active Directory client-credentials wire format
//!
//! Builders write into fixed-capacity `heapless` strings; the response parser
//! borrows straight from the response buffer.

use nimbus_common::error::{SdkError, SdkResult};
use serde::Deserialize;

/// Authority used when none is configured
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";

/// Path appended to `authority + tenant_id`
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth2/v2.0/token";

pub const AAD_REQUEST_URL_CAPACITY: usize = 256;
pub const AAD_REQUEST_BODY_CAPACITY: usize = 1024;
pub const AAD_REQUEST_HEADER_CAPACITY: usize = 128;
pub const AAD_RESPONSE_CAPACITY: usize = 4096;

/// `<authority><tenant_id>/oauth2/v2.0/token`
///
/// # Errors
/// `BufferTooSmall` when the URL exceeds [`AAD_REQUEST_URL_CAPACITY`].
pub fn token_url(
    authority: &str,
    tenant_id: &str,
) -> SdkResult<heapless::String<AAD_REQUEST_URL_CAPACITY>> {
    concat("token url", &[authority, tenant_id, TOKEN_ENDPOINT_PATH])
}

/// Form body for the client-credentials grant; values are not escaped
///
/// # Errors
/// `BufferTooSmall` when the body exceeds [`AAD_REQUEST_BODY_CAPACITY`].
pub fn token_body(
    client_id: &str,
    scopes: &str,
    client_secret: &str,
) -> SdkResult<heapless::String<AAD_REQUEST_BODY_CAPACITY>> {
    concat(
        "token request body",
        &[
            "grant_type=client_credentials&client_id=",
            client_id,
            "&scope=",
            scopes,
            "&client_secret=",
            client_secret,
        ],
    )
}

/// Fields of a successful token response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenResponse<'r> {
    /// Opaque bearer token; escaped JSON strings are rejected
    #[serde(borrow)]
    pub access_token: &'r str,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Parse `{"access_token": "...", "expires_in": N, ...}`
///
/// # Errors
/// `MalformedResponse` when the body is not such an object, the token is
/// empty, or the lifetime is negative.
pub fn parse_token_response(body: &[u8]) -> SdkResult<TokenResponse<'_>> {
    let parsed: TokenResponse<'_> = serde_json::from_slice(body)
        .map_err(|_| SdkError::malformed("token response is not a token object"))?;
    if parsed.access_token.is_empty() {
        return Err(SdkError::malformed("access_token is empty"));
    }
    if parsed.expires_in < 0 {
        return Err(SdkError::malformed("expires_in is negative"));
    }
    Ok(parsed)
}

fn concat<const N: usize>(buffer: &'static str, parts: &[&str]) -> SdkResult<heapless::String<N>> {
    let required = parts.iter().map(|part| part.len()).sum();
    if required > N {
        return Err(SdkError::buffer_too_small(buffer, required, N));
    }
    let mut out = heapless::String::new();
    for part in parts {
        out.push_str(part).map_err(|()| SdkError::buffer_too_small(buffer, required, N))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url() {
        let url = token_url(DEFAULT_AUTHORITY, "TenantID").unwrap();
        assert_eq!(url.as_str(), "https://login.microsoftonline.com/TenantID/oauth2/v2.0/token");

        let sovereign = token_url("https://login.microsoftonline.us/", "t").unwrap();
        assert_eq!(sovereign.as_str(), "https://login.microsoftonline.us/t/oauth2/v2.0/token");
    }

    #[test]
    fn test_token_url_overflow() {
        let tenant = "t".repeat(AAD_REQUEST_URL_CAPACITY);
        let err = token_url(DEFAULT_AUTHORITY, &tenant).unwrap_err();
        assert!(matches!(
            err,
            SdkError::BufferTooSmall { buffer: "token url", capacity: AAD_REQUEST_URL_CAPACITY, .. }
        ));
    }

    #[test]
    fn test_token_body_field_order() {
        let scopes = "https://vault.azure.net/.default";
        let body = token_body("ClientID", scopes, "ClientSecret").unwrap();
        assert_eq!(
            body.as_str(),
            "grant_type=client_credentials&client_id=ClientID\
             &scope=https://vault.azure.net/.default&client_secret=ClientSecret"
        );
    }

    /// Validates the token response parser.
    ///
    /// Assertions:
    /// - Extra fields are ignored and whitespace is tolerated.
    /// - Missing fields, empty tokens and non-JSON bodies are malformed.
    #[test]
    fn test_parse_token_response() {
        let body = br#"{ "token_type": "Bearer", "access_token" : "AccessToken", "expires_in" : 3600 }"#;
        let parsed = parse_token_response(body).unwrap();
        assert_eq!(parsed, TokenResponse { access_token: "AccessToken", expires_in: 3600 });

        for bad in [
            &br#"{"access_token":"AccessToken"}"#[..],
            br#"{"expires_in":3600}"#,
            br#"{"access_token":"","expires_in":3600}"#,
            br#"{"access_token":"a","expires_in":-1}"#,
            br#"{"access_token":"a","expires_in":"3600"}"#,
            b"<html>error</html>",
            b"",
        ] {
            assert!(matches!(parse_token_response(bad), Err(SdkError::MalformedResponse { .. })));
        }
    }
}
