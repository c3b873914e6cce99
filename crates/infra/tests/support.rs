//! Shared helpers for `nimbus-infra` integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use nimbus_core::context::Context;
use nimbus_core::http::{Method, Request, Response};
use nimbus_core::{Pipeline, SdkResult};
use tempfile::TempDir;

pub const TENANT_ID: &str = "TenantID";
pub const CLIENT_ID: &str = "ClientID";
pub const CLIENT_SECRET: &str = "ClientSecret";
pub const SCOPES: &str = "https://storage.azure.com/.default";

/// Form body the token endpoint must receive for the constants above
pub fn expected_token_body() -> String {
    format!(
        "grant_type=client_credentials&client_id={}&scope={}&client_secret={}",
        CLIENT_ID, SCOPES, CLIENT_SECRET
    )
}

/// JSON body of a successful token response
pub fn token_json(access_token: &str, expires_in: i64) -> String {
    format!(r#"{{"access_token":"{access_token}","expires_in":{expires_in}}}"#)
}

/// A config file inside a temporary directory that is removed on drop
pub struct ConfigFile {
    pub path: PathBuf,
    _dir: TempDir,
}

impl ConfigFile {
    pub fn new(name: &str, contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("config file should be created");
        file.write_all(contents.as_bytes()).expect("config file should be written");
        Self { path, _dir: dir }
    }
}

/// Run a GET for `url` and return the final status and body
pub fn get<const N: usize>(
    pipeline: &Pipeline<'_, N>,
    context: &Context<'_>,
    url: &str,
) -> SdkResult<(u16, Vec<u8>)> {
    let mut url_buffer = [0u8; 256];
    let mut header_buffer = [0u8; 2_560];
    let mut raw = [0u8; 4_096];
    let mut request =
        Request::new(context, Method::Get, url, &mut url_buffer, &mut header_buffer, b"")?;
    let mut response = Response::new(&mut raw);
    pipeline.process(&mut request, &mut response)?;
    Ok((response.status()?, response.body()?.to_vec()))
}
