#![allow(dead_code)]
//! Shared fixtures for the mock-server integration tests.

use mockito::{Matcher, Mock, ServerGuard};
use salt_api_client::{Credential, SaltClient};
use serde_json::json;

pub const CA_PEM: &[u8] = include_bytes!("../fixtures/ca.pem");

/// Comfortably past any test run.
pub const FAR_FUTURE_EPOCH: f64 = 32_503_680_000.0;

pub fn client_for(server: &ServerGuard) -> SaltClient {
    let creds = Credential::new("storage-operator", "secret", "basic").unwrap();
    SaltClient::new(creds, CA_PEM, Some(&server.url())).unwrap()
}

pub fn login_body(token: &str) -> String {
    json!({"return": [{"token": token, "expire": FAR_FUTURE_EPOCH}]}).to_string()
}

/// Mock a successful login handing out `token`.
pub async fn mock_login(server: &mut ServerGuard, token: &str) -> Mock {
    server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .with_body(login_body(token))
        .create_async()
        .await
}

/// Matcher for the fixed short-poll hint attached to every request.
pub fn timeout_query() -> Matcher {
    Matcher::UrlEncoded("timeout".into(), "1".into())
}
