//! End-to-end refresh-and-retry scenarios
//!
//! Runs the full stack (auth client + session manager + API client) against
//! a mocked backend to verify the refresh protocol: single-flight
//! coordination, one-replay bound, credential rotation, and the
//! unauthenticated signal.

use std::sync::Arc;
use std::time::Duration;

use smarket_client::{ApiClient, ApiClientConfig};
use smarket_common::auth::{
    AuthClient, MemoryTokenStore, SessionEvent, SessionManager, TokenPair, TokenStore,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Session = SessionManager<AuthClient, MemoryTokenStore>;

async fn session_for(server: &MockServer, seed: Option<TokenPair>) -> (Arc<Session>, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    if let Some(pair) = seed {
        store.store(&pair).await.unwrap();
    }

    let session = Arc::new(SessionManager::new(AuthClient::new(server.uri()), Arc::clone(&store)));
    (session, store)
}

fn client_for(server: &MockServer, session: Arc<Session>) -> ApiClient {
    let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
    ApiClient::builder().config(config).session(session).build().unwrap()
}

fn expired_pair() -> TokenPair {
    TokenPair { access_token: "access-1".to_string(), refresh_token: "refresh-1".to_string() }
}

fn rotated_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "access-2",
        "refresh_token": "refresh-2",
        "token_type": "bearer",
    })
}

fn invoice_list() -> serde_json::Value {
    serde_json::json!([{ "id": 1, "total": "129.90" }])
}

/// Mount a refresh endpoint that accepts `refresh-1` and rotates the pair.
async fn mount_refresh(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("Authorization", "Bearer refresh-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rotated_body())
                .set_delay(Duration::from_millis(50)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn expired_token_is_refreshed_transparently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/invoices"))
        .and(header("Authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_list()))
        .mount(&server)
        .await;

    mount_refresh(&server, 1).await;

    let (session, store) = session_for(&server, Some(expired_pair())).await;
    let client = client_for(&server, session);

    // The caller receives the list and never sees the intermediate 401.
    let invoices: serde_json::Value = client.get("/invoices").await.unwrap();
    assert_eq!(invoices, invoice_list());

    // Rotation: both stored values were overwritten.
    let pair = store.load().await.unwrap().unwrap();
    assert_eq!(pair.access_token, "access-2");
    assert_eq!(pair.refresh_token, "refresh-2");
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let server = MockServer::start().await;

    for route in ["/invoices", "/products"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "Bearer access-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoice_list()))
            .mount(&server)
            .await;
    }

    // The de-duplication invariant: exactly one refresh call on the wire.
    mount_refresh(&server, 1).await;

    let (session, _) = session_for(&server, Some(expired_pair())).await;
    let client = client_for(&server, session);

    let (invoices, products) = tokio::join!(
        client.get::<serde_json::Value>("/invoices"),
        client.get::<serde_json::Value>("/products"),
    );

    assert_eq!(invoices.unwrap(), invoice_list());
    assert_eq!(products.unwrap(), invoice_list());
}

#[tokio::test]
async fn expired_refresh_token_kills_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_string("refresh token expired"))
        .expect(1)
        .mount(&server)
        .await;

    let (session, store) = session_for(&server, Some(expired_pair())).await;
    let mut events = session.subscribe();
    let client = client_for(&server, Arc::clone(&session));

    let err = client.get::<serde_json::Value>("/invoices").await.unwrap_err();
    assert!(err.is_auth_expired());

    // Credentials cleared, unauthenticated signal emitted exactly once.
    assert_eq!(store.load().await.unwrap(), None);
    assert!(!session.is_authenticated().await);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Unauthenticated);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn missing_refresh_token_never_calls_refresh_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rotated_body()))
        .expect(0)
        .mount(&server)
        .await;

    let (session, _) = session_for(&server, None).await;
    let client = client_for(&server, session);

    let err = client.get::<serde_json::Value>("/invoices").await.unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn second_401_after_refresh_is_terminal() {
    let server = MockServer::start().await;

    // Backend rejects the request regardless of token.
    Mock::given(method("GET"))
        .and(path("/invoices"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    mount_refresh(&server, 1).await;

    let (session, _) = session_for(&server, Some(expired_pair())).await;
    let client = client_for(&server, session);

    let err = client.get::<serde_json::Value>("/invoices").await.unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn non_401_failures_do_not_touch_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rotated_body()))
        .expect(0)
        .mount(&server)
        .await;

    let (session, store) = session_for(&server, Some(expired_pair())).await;
    let client = client_for(&server, session);

    let err = client.get::<serde_json::Value>("/invoices").await.unwrap_err();
    assert_eq!(err.status(), Some(503));

    // The credential pair is untouched.
    assert_eq!(store.load().await.unwrap(), Some(expired_pair()));
}
