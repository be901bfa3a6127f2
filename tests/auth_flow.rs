//! Authentication and token lifecycle against a mock Salt API.

mod common;

use common::{client_for, login_body, mock_login, timeout_query, CA_PEM};
use mockito::{Matcher, Server};
use salt_api_client::{Credential, Error, SaltClient, DEFAULT_MASTER_ADDRESS};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn still_running() -> String {
    json!({"info": [{"Result": {}}]}).to_string()
}

#[test]
fn empty_ca_certificate_is_refused() {
    let creds = Credential::new("storage-operator", "secret", "basic").unwrap();
    let err = SaltClient::new(creds, b"", None).unwrap_err();
    assert!(matches!(err, Error::EmptyCaCertificate));
}

#[test]
fn empty_address_override_falls_back_to_the_default() {
    let creds = Credential::new("storage-operator", "secret", "basic").unwrap();
    let client = SaltClient::new(creds, CA_PEM, Some("")).unwrap();
    assert_eq!(client.address(), DEFAULT_MASTER_ADDRESS);
}

#[tokio::test]
async fn basic_credentials_are_sent_as_password() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .match_header("x-auth-token", Matcher::Missing)
        .match_body(Matcher::Json(json!({
            "eauth": "kubernetes_rbac",
            "username": "storage-operator",
            "password": "secret",
        })))
        .with_body(login_body("tok-1"))
        .create_async()
        .await;
    let jobs = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .match_header("x-auth-token", "tok-1")
        .with_body(still_running())
        .create_async()
        .await;

    let client = client_for(&server);
    let status = client.poll_job("1234", "node-1").await.unwrap();

    assert!(status.is_still_running());
    login.assert_async().await;
    jobs.assert_async().await;
}

#[tokio::test]
async fn bearer_credentials_are_sent_as_token() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .match_body(Matcher::Json(json!({
            "eauth": "kubernetes_rbac",
            "username": "storage-operator",
            "token": "service-account-token",
        })))
        .with_body(login_body("tok-1"))
        .create_async()
        .await;
    let jobs = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .with_body(still_running())
        .create_async()
        .await;

    let creds = Credential::new("storage-operator", "service-account-token", "bearer").unwrap();
    let client = SaltClient::new(creds, CA_PEM, Some(&server.url())).unwrap();
    client.poll_job("1234", "node-1").await.unwrap();

    login.assert_async().await;
    jobs.assert_async().await;
}

#[tokio::test]
async fn valid_token_is_reused_across_requests() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "tok-1").await;
    let jobs = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .match_header("x-auth-token", "tok-1")
        .with_body(still_running())
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    client.poll_job("1234", "node-1").await.unwrap();
    client.poll_job("1234", "node-1").await.unwrap();

    // One authentication serves both requests.
    login.assert_async().await;
    jobs.assert_async().await;
}

#[tokio::test]
async fn expired_token_triggers_reauthentication() {
    let mut server = Server::new_async().await;
    // The handed-out token is already expired when it arrives.
    let login = server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .with_body(json!({"return": [{"token": "tok-1", "expire": 1000.0}]}).to_string())
        .expect(2)
        .create_async()
        .await;
    let jobs = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .with_body(still_running())
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    client.poll_job("1234", "node-1").await.unwrap();
    client.poll_job("1234", "node-1").await.unwrap();

    login.assert_async().await;
    jobs.assert_async().await;
}

#[tokio::test]
async fn rejected_token_is_retried_exactly_once() {
    let mut server = Server::new_async().await;
    let logins = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&logins);
    let login = server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .expect(2)
        .with_body_from_request(move |_| {
            let token = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                "tok-1"
            } else {
                "tok-2"
            };
            login_body(token).into_bytes()
        })
        .create_async()
        .await;
    // The server restarted: the first, locally-valid token is rejected.
    let rejected = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .match_header("x-auth-token", "tok-1")
        .with_status(401)
        .with_body("Unauthorized")
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .match_header("x-auth-token", "tok-2")
        .with_body(still_running())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let status = client.poll_job("1234", "node-1").await.unwrap();

    assert!(status.is_still_running());
    login.assert_async().await;
    rejected.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn persistent_401_surfaces_after_exactly_two_sends() {
    let mut server = Server::new_async().await;
    let logins = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&logins);
    let login = server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .expect(2)
        .with_body_from_request(move |_| {
            let token = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                "tok-1"
            } else {
                "tok-2"
            };
            login_body(token).into_bytes()
        })
        .create_async()
        .await;
    let jobs = server
        .mock("GET", "/jobs/1234")
        .match_query(timeout_query())
        .with_status(401)
        .with_body("Unauthorized")
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.poll_job("1234", "node-1").await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Salt job polling failed for ID 1234"), "{msg}");
    assert!(msg.contains("Salt API failed with code 401: Unauthorized"), "{msg}");
    login.assert_async().await;
    jobs.assert_async().await;
}

#[tokio::test]
async fn authentication_failure_carries_identity_context() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/login")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.poll_job("1234", "node-1").await.unwrap_err();

    let msg = err.to_string();
    assert!(
        msg.contains("Salt API authentication failed (username=storage-operator, type=basic)"),
        "{msg}"
    );
}

#[tokio::test]
async fn malformed_login_response_is_an_authentication_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/login")
        .match_query(timeout_query())
        .with_body(json!({"return": []}).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.poll_job("1234", "node-1").await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Salt API authentication failed"), "{msg}");
    assert!(
        msg.contains("unexpected Salt API response shape at return[0].token"),
        "{msg}"
    );
}
