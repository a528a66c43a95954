//! Integration tests for session recovery on 401 responses.
//!
//! Requests that fail with 401 while a refresh is in flight must wait for
//! that refresh instead of starting their own, then replay exactly once.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use boxoffice_client::{ApiClient, ApiError, ApiRequest, ClientConfig};
use boxoffice_core::requests::LoginCredentials;
use boxoffice_core::routes::SESSION_EXPIRED_REDIRECT;
use boxoffice_runtime::{SessionConfig, SessionError, SessionEvent, SessionManager};
use boxoffice_testing::{fixtures, helpers};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROTECTED: &str = "/bookings/my-bookings";

async fn setup() -> (MockServer, ApiClient) {
    helpers::init_test_tracing();
    let server = MockServer::start().await;
    let client = ApiClient::new(&ClientConfig::new(server.uri())).unwrap();
    (server, client)
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(fixtures::error_envelope("Not authenticated"))
}

fn refreshed(user: &boxoffice_core::types::User) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(fixtures::envelope(json!({ "user": fixtures::to_json(user) })))
        .set_delay(Duration::from_millis(300))
}

fn bookings_page() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(fixtures::envelope(json!({
        "bookings": [fixtures::to_json(&fixtures::booking())],
        "pagination": null
    })))
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh_and_replay() {
    let (server, client) = setup().await;
    client.context().establish(&fixtures::customer()).await;

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(unauthorized())
        .up_to_n_times(5)
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(bookings_page())
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(refreshed(&fixtures::other_customer()))
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = join_all((0..5).map(|_| client.send(ApiRequest::get(PROTECTED)))).await;

    for outcome in outcomes {
        assert!(outcome.unwrap().success);
    }
    assert_eq!(client.context().store().user(), Some(fixtures::other_customer()));
    assert!(!client.context().is_expired());
}

#[tokio::test]
async fn test_rejected_refresh_expires_session_for_every_waiter() {
    let (server, client) = setup().await;
    client.context().establish(&fixtures::customer()).await;
    client
        .context()
        .cache()
        .set(boxoffice_runtime::keys::auth::managers(), json!([]))
        .await;
    let mut events = client.context().subscribe();

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(unauthorized())
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    let outcomes = join_all((0..3).map(|_| client.send(ApiRequest::get(PROTECTED)))).await;

    for outcome in outcomes {
        assert!(matches!(
            outcome.unwrap_err(),
            ApiError::Session(SessionError::Unauthorized)
        ));
    }
    assert!(client.context().is_expired());
    assert!(!client.context().store().is_authenticated());
    assert!(client.context().cache().is_empty().await);
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Expired {
            redirect: SESSION_EXPIRED_REDIRECT.to_string()
        }
    );
}

#[tokio::test]
async fn test_failed_login_does_not_expire_or_refresh() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(fixtures::error_envelope("Invalid credentials")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(refreshed(&fixtures::customer()))
        .expect(0)
        .mount(&server)
        .await;

    let error = client
        .auth()
        .sign_in(&LoginCredentials::new("amina@example.com", "wrong-password"))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(401));
    assert_eq!(error.to_string(), "Invalid credentials");
    assert!(!client.context().is_expired());
}

#[tokio::test]
async fn test_rejected_logout_expires_without_refresh() {
    let (server, client) = setup().await;
    client.context().establish(&fixtures::customer()).await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(refreshed(&fixtures::customer()))
        .expect(0)
        .mount(&server)
        .await;

    let envelope = client.auth().logout().await;

    assert!(!envelope.success);
    assert!(client.context().is_expired());
    assert!(!client.context().store().is_authenticated());
}

#[tokio::test]
async fn test_rejected_replay_is_not_refreshed_again() {
    let (server, client) = setup().await;
    client.context().establish(&fixtures::customer()).await;

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(refreshed(&fixtures::customer()))
        .expect(1)
        .mount(&server)
        .await;

    let error = client.send(ApiRequest::get(PROTECTED)).await.unwrap_err();

    assert!(error.is_unauthorized());
    assert!(!client.context().is_expired());
    assert!(client.context().store().is_authenticated());
}

#[tokio::test]
async fn test_refresh_without_user_keeps_current_user() {
    let (server, client) = setup().await;
    client.context().establish(&fixtures::seller()).await;

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(unauthorized())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(bookings_page())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.bookings().mine(&Default::default()).await.unwrap();

    assert_eq!(page.bookings.len(), 1);
    assert_eq!(client.context().store().user(), Some(fixtures::seller()));
}

#[tokio::test]
async fn test_server_error_is_not_treated_as_expiry() {
    let (server, client) = setup().await;
    client.context().establish(&fixtures::customer()).await;

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(ResponseTemplate::new(503).set_body_json(fixtures::error_envelope("Maintenance")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(refreshed(&fixtures::customer()))
        .expect(0)
        .mount(&server)
        .await;

    let error = client.send(ApiRequest::get(PROTECTED)).await.unwrap_err();

    assert_eq!(error.status(), Some(503));
    assert!(error.is_retryable());
    assert!(client.context().store().is_authenticated());
}

#[tokio::test]
async fn test_session_verification_refreshes_on_401() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(unauthorized())
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::envelope(json!({
            "user": fixtures::to_json(&fixtures::customer())
        }))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(refreshed(&fixtures::customer()))
        .expect(1)
        .mount(&server)
        .await;

    let manager = SessionManager::new(
        Arc::new(client.clone()),
        Arc::clone(client.context()),
        SessionConfig::default(),
    );
    let status = manager.start(Some(fixtures::customer())).await;

    assert!(status.active);
    assert!(!client.context().is_expired());
    assert_eq!(client.context().store().user(), Some(fixtures::customer()));
    manager.stop().await;
}
