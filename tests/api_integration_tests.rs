use std::time::Duration;

use serde_json::{Value, json};
use trailguide::api::types::{ApiError, AuthTokens};
use trailguide::api::ApiClient;
use trailguide::core::auth::AuthService;
use trailguide::core::session::SessionStore;
use trailguide::core::{RequestError, RequestExecutor};
use trailguide::storage::Storage;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn session() -> SessionStore {
    SessionStore::new(Storage::in_memory())
}

fn client_for(server: &MockServer, session: &SessionStore) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5))
        .unwrap()
        .with_session(session.clone())
}

fn fetcher(client: ApiClient) -> RequestExecutor<String, Value, ApiError> {
    RequestExecutor::new(move |path: String| {
        let client = client.clone();
        async move { client.get::<Value>(&path).await }
    })
}

fn login_body() -> Value {
    json!({
        "data": {
            "accessToken": "access-1",
            "refreshToken": "refresh-1",
            "user": {
                "id": "u-7",
                "name": "Bea Costa",
                "email": "bea@example.com",
                "homeCity": "Lisbon"
            }
        },
        "message": "Welcome"
    })
}

// ============================================================================
// API Client + Executor
// ============================================================================

#[tokio::test]
async fn test_get_success_populates_state() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/places/nearby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "name": "Torre dos Clérigos"}]
        })))
        .mount(&mock_server)
        .await;

    let s = session();
    let fetch = fetcher(client_for(&mock_server, &s));
    let data = fetch.execute("places/nearby".to_string()).await;

    let data = data.expect("2xx response should return data");
    assert_eq!(data[0]["name"], "Torre dos Clérigos");
    let state = fetch.state();
    assert_eq!(state.data, Some(data));
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_bearer_token_is_attached_when_stored() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/favorites"))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let s = session();
    assert!(s.set_auth_token("tok123").await);
    let fetch = fetcher(client_for(&mock_server, &s));

    assert_eq!(fetch.execute("/me/favorites".to_string()).await, Some(json!([])));
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&mock_server)
        .await;

    let s = session();
    fetcher(client_for(&mock_server, &s))
        .execute("events".to_string())
        .await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_error_status_is_normalized() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/places/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Place not found",
            "code": "NOT_FOUND"
        })))
        .mount(&mock_server)
        .await;

    let s = session();
    let fetch = fetcher(client_for(&mock_server, &s));
    let result = fetch.execute("places/999".to_string()).await;

    assert!(result.is_none());
    let state = fetch.state();
    assert!(state.data.is_none());
    assert!(!state.loading);
    let error = state.error.unwrap();
    assert_eq!(error.status(), Some(404));
    let info = error.info().unwrap();
    assert_eq!(info.message, "Place not found");
    assert_eq!(info.code.as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_error_status_without_message_uses_default() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tours"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let s = session();
    let fetch = fetcher(client_for(&mock_server, &s));
    fetch.execute("tours".to_string()).await;

    let error = fetch.error().unwrap();
    assert_eq!(error.status(), Some(500));
    assert_eq!(error.info().unwrap().message, "Request failed");
}

#[tokio::test]
async fn test_connection_failure_is_thrown_error() {
    let client = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let fetch = fetcher(client);

    assert!(fetch.execute("places".to_string()).await.is_none());
    assert!(fetch.data().is_none());
    match fetch.error() {
        Some(RequestError::Thrown(e)) => assert!(matches!(*e, ApiError::Network(_))),
        other => panic!("expected a thrown network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_thrown_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": 1}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(&mock_server.uri(), Duration::from_millis(200)).unwrap();
    let fetch = fetcher(client);
    fetch.execute("slow".to_string()).await;

    assert!(matches!(
        fetch.error().as_ref().and_then(|e| e.as_thrown()),
        Some(ApiError::Network(_))
    ));
}

#[tokio::test]
async fn test_undecodable_success_body_is_thrown_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let s = session();
    let fetch = fetcher(client_for(&mock_server, &s));
    fetch.execute("broken".to_string()).await;

    assert!(matches!(
        fetch.error().as_ref().and_then(|e| e.as_thrown()),
        Some(ApiError::Parse(_))
    ));
}

// ============================================================================
// Auth Flows
// ============================================================================

#[tokio::test]
async fn test_login_stores_tokens_and_profile() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "bea@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let s = session();
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());
    let tokens = auth.login("bea@example.com", "hunter2").await.unwrap();

    assert_eq!(tokens.access_token, "access-1");
    assert_eq!(s.get_auth_token().await.as_deref(), Some("access-1"));
    assert_eq!(s.get_refresh_token().await.as_deref(), Some("refresh-1"));
    let user = auth.current_user().await.unwrap();
    assert_eq!(user.name, "Bea Costa");
    assert_eq!(user.home_city.as_deref(), Some("Lisbon"));
    assert!(auth.login_requests().error().is_none());
}

#[tokio::test]
async fn test_failed_login_stores_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation failed",
            "errors": {"password": ["is required"]}
        })))
        .mount(&mock_server)
        .await;

    let s = session();
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());

    assert!(auth.login("bea@example.com", "").await.is_none());
    assert!(!s.is_authenticated().await);

    let error = auth.login_requests().error().unwrap();
    let info = error.info().unwrap();
    assert_eq!(info.status, 422);
    assert_eq!(info.errors.as_ref().unwrap()["password"], vec!["is required".to_string()]);
}

#[tokio::test]
async fn test_refresh_without_refresh_token_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let s = session();
    s.set_auth_token("access-only").await;
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());

    assert!(auth.refresh().await.is_none());
    assert!(auth.refresh_requests().state().is_idle());
}

#[tokio::test]
async fn test_refresh_replaces_access_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"accessToken": "access-2"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let s = session();
    s.set_auth_token("access-1").await;
    s.set_refresh_token("refresh-1").await;
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());

    let tokens: AuthTokens = auth.refresh().await.unwrap();
    assert_eq!(tokens.access_token, "access-2");
    assert_eq!(s.get_auth_token().await.as_deref(), Some("access-2"));
    // Not rotated by the server, so the old one stays.
    assert_eq!(s.get_refresh_token().await.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(&mock_server)
        .await;

    let s = session();
    s.set_auth_token("access-1").await;
    s.set_refresh_token("refresh-1").await;
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());

    assert!(auth.refresh().await.is_none());
    assert_eq!(s.get_auth_token().await, None);
    assert_eq!(s.get_refresh_token().await, None);
    assert_eq!(s.get_user_data().await, None);
}

#[tokio::test]
async fn test_refresh_server_error_keeps_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let s = session();
    s.set_auth_token("access-1").await;
    s.set_refresh_token("refresh-1").await;
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());

    assert!(auth.refresh().await.is_none());
    assert_eq!(s.get_auth_token().await.as_deref(), Some("access-1"));
    assert_eq!(auth.refresh_requests().error().and_then(|e| e.status()), Some(503));
}

#[tokio::test]
async fn test_logout_clears_session_and_request_state() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&mock_server)
        .await;

    let s = session();
    let auth = AuthService::new(client_for(&mock_server, &s), s.clone());
    auth.login("bea@example.com", "hunter2").await.unwrap();

    assert!(auth.logout().await);
    assert!(auth.current_user().await.is_none());
    assert!(!s.is_authenticated().await);
    assert!(auth.login_requests().state().is_idle());
}
