//! Dispatcher behaviour against a mock server.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use portico_client::{
    ApiError, ApiRefresher, AuthOptions, CredentialProvider, FormField, FormValue, HttpClient,
    MemoryCredentials, RequestConfig, RequestOptions, ResponseType, TokenPair, TokenRefresher,
};
use reqwest::Method;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug)]
struct CountingRefresher {
    calls: AtomicU32,
    delay: Duration,
    fail: bool,
}

impl CountingRefresher {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            delay,
            fail: false,
        })
    }

    fn failing(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            delay,
            fail: true,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, _refresh_token: Option<String>) -> portico_client::Result<TokenPair> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            Err(ApiError::invalid_request("refresh token revoked"))
        } else {
            Ok(TokenPair::new("new", Some("r-new".to_string())))
        }
    }
}

fn creds() -> Arc<MemoryCredentials> {
    Arc::new(MemoryCredentials::with_tokens(TokenPair::new(
        "old",
        Some("r-old".to_string()),
    )))
}

fn client(server: &MockServer, auth: Option<AuthOptions>) -> HttpClient {
    let mut builder = HttpClient::builder().base_url(server.uri());
    if let Some(auth) = auth {
        builder = builder.auth(auth);
    }
    builder.build().unwrap()
}

async fn mount_protected(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/secret"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/secret"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(server)
        .await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Basic dispatch
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn attaches_bearer_token_and_unwraps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/profile"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "ok",
            "result": {"id": 7, "name": "Ada", "email": "ada@example.com", "role": "admin"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Some(AuthOptions::new(creds())));
    let profile = client.auth().profile().await.unwrap();
    assert_eq!(profile.code, 0);
    assert_eq!(profile.result.id, 7);
    assert_eq!(profile.result.name, "Ada");
}

#[tokio::test]
async fn sends_no_authorization_without_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pong")))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let reply: String = client.get("ping", None).await.unwrap();
    assert_eq!(reply, "pong");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn sends_no_authorization_when_provider_has_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client(
        &server,
        Some(AuthOptions::new(Arc::new(MemoryCredentials::new()))),
    );
    let reply: Option<Value> = client.get("ping", None).await.unwrap();
    assert!(reply.is_none());

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn post_put_delete_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "message": "ok",
            "result": {"users": [], "total": 0, "page": 2, "pageSize": 5}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users"))
        .and(body_json(json!({"name": "Bo", "email": "bo@example.com", "role": "user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "message": "created",
            "result": {"id": 3, "name": "Bo", "email": "bo@example.com", "role": "user",
                       "createTime": "2024-05-01 10:00:00"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/users/3"))
        .and(body_json(json!({"role": "admin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "message": "updated",
            "result": {"id": 3, "name": "Bo", "email": "bo@example.com", "role": "admin",
                       "createTime": "2024-05-01 10:00:00"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "message": "deleted", "result": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let users = client.users();

    let page = users
        .list(portico_client::ListUsersQuery {
            page: Some(2),
            page_size: Some(5),
            keyword: None,
        })
        .await
        .unwrap();
    assert_eq!(page.result.page, 2);

    let created = users
        .create(&portico_client::CreateUserRequest {
            name: "Bo".into(),
            email: "bo@example.com".into(),
            role: portico_client::Role::User,
        })
        .await
        .unwrap();
    assert_eq!(created.result.id, 3);

    let updated = users
        .update(
            3,
            &portico_client::UpdateUserRequest {
                role: Some(portico_client::Role::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.result.role, portico_client::Role::Admin);

    let deleted = users.delete(3).await.unwrap();
    assert_eq!(deleted.message, "deleted");
    assert!(deleted.result.is_null());
}

#[tokio::test]
async fn generic_request_with_text_response() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/notes/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("patched"))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let text: String = client
        .request(
            RequestConfig::new(Method::PATCH, "/notes/1")
                .payload(json!({"title": "x"}))
                .options(RequestOptions::new().response_type(ResponseType::Text)),
        )
        .await
        .unwrap();
    assert_eq!(text, "patched");
}

// ─────────────────────────────────────────────────────────────────────────────
// Error normalization
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn http_error_is_normalized_with_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"reason": "no such user"})))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = client.users().get(99).await.unwrap_err();
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "resource not found (404)");
    assert_eq!(err.details, Some(json!({"reason": "no such user"})));
    assert!(!err.is_network_error() && !err.is_timeout() && !err.is_canceled());
}

#[tokio::test]
async fn unmapped_status_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teapot"))
        .respond_with(ResponseTemplate::new(418).set_body_string("short and stout"))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = client.get::<Value>("teapot", None).await.unwrap_err();
    assert_eq!(err.message, "connection error (418)");
    assert_eq!(err.details, Some(json!("short and stout")));
}

#[tokio::test]
async fn timeout_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = client
        .get::<Value>(
            "slow",
            Some(RequestOptions::new().timeout(Duration::from_millis(100))),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(!err.is_network_error());
    assert_eq!(err.message, "request timed out");
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn client_wide_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HttpClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = client.get::<Value>("slow", None).await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let client = HttpClient::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let err = client.get::<Value>("anything", None).await.unwrap_err();
    assert!(err.is_network_error());
    assert_eq!(err.message, "network error");
}

#[tokio::test]
async fn undecodable_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = client(&server, None);
    let err = client.users().get(1).await.unwrap_err();
    assert_eq!(err.kind, portico_client::ErrorKind::Decode);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelling_one_request_leaves_others_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"done": true}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let client = client(&server, None);
    let token_a = client.cancellation_token();
    let token_b = client.cancellation_token();

    let a = client.get::<Value>(
        "slow",
        Some(RequestOptions::new().cancel_token(token_a.clone())),
    );
    let b = client.get::<Value>("slow", Some(RequestOptions::new().cancel_token(token_b)));
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token_a.cancel();
    };

    let (a, b, ()) = tokio::join!(a, b, cancel);

    let err = a.unwrap_err();
    assert!(err.is_canceled());
    assert_eq!(err.message, "request canceled");
    assert_eq!(b.unwrap(), json!({"done": true}));
}

#[tokio::test]
async fn already_cancelled_token_never_sends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let token = client.cancellation_token();
    token.cancel();
    let err = client
        .get::<Value>("x", Some(RequestOptions::new().cancel_token(token)))
        .await
        .unwrap_err();
    assert!(err.is_canceled());
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh protocol
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_without_refresher_is_returned_as_is() {
    let server = MockServer::start().await;
    mount_protected(&server).await;

    let creds = creds();
    let client = client(&server, Some(AuthOptions::new(creds.clone())));
    let err = client.get::<Value>("secret", None).await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "unauthorized, please log in again (401)");
    assert_eq!(creds.store_count(), 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server).await;

    let creds = creds();
    let refresher = CountingRefresher::new(Duration::from_millis(50));
    let client = client(
        &server,
        Some(AuthOptions::new(creds.clone()).with_refresher(refresher.clone())),
    );

    let (a, b) = tokio::join!(
        client.get::<Value>("secret", None),
        client.get::<Value>("secret", None)
    );

    assert_eq!(a.unwrap(), json!({"ok": true}));
    assert_eq!(b.unwrap(), json!({"ok": true}));
    assert_eq!(refresher.calls(), 1);
    assert_eq!(creds.store_count(), 1);
    assert_eq!(creds.access_token().as_deref(), Some("new"));
    assert_eq!(creds.refresh_token().as_deref(), Some("r-new"));
    assert!(!client.refresh_coordinator().is_refreshing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server).await;

    let refresher = CountingRefresher::new(Duration::from_millis(200));
    let client = client(
        &server,
        Some(AuthOptions::new(creds()).with_refresher(refresher.clone())),
    );

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>("secret", None).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), json!({"ok": true}));
    }
    assert_eq!(refresher.calls(), 1);
}

#[tokio::test]
async fn retried_request_is_not_retried_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/secret"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let refresher = CountingRefresher::new(Duration::from_millis(1));
    let client = client(
        &server,
        Some(AuthOptions::new(creds()).with_refresher(refresher.clone())),
    );

    let err = client.get::<Value>("secret", None).await.unwrap_err();
    assert_eq!(err.status, Some(401));
    assert_eq!(refresher.calls(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let retried_auth = requests[1].headers.get("authorization").unwrap();
    assert_eq!(retried_auth.to_str().unwrap(), "Bearer new");
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/secret"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let refresher = CountingRefresher::new(Duration::from_millis(1));
    let client = client(
        &server,
        Some(AuthOptions::new(creds()).with_refresher(refresher.clone())),
    );

    let err = client.get::<Value>("secret", None).await.unwrap_err();
    assert_eq!(err.status, Some(403));
    assert_eq!(refresher.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_failure_reaches_initiator_only() {
    let server = MockServer::start().await;
    mount_protected(&server).await;

    let creds = creds();
    let refresher = CountingRefresher::failing(Duration::from_millis(100));
    let client = client(
        &server,
        Some(AuthOptions::new(creds.clone()).with_refresher(refresher.clone())),
    );

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>("secret", None).await })
        })
        .collect();

    let mut refresh_errors = 0;
    let mut unauthorized = 0;
    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        if err.message == "refresh token revoked" {
            refresh_errors += 1;
        } else {
            assert_eq!(err.status, Some(401));
            unauthorized += 1;
        }
    }

    assert_eq!(refresher.calls(), 1);
    assert_eq!(refresh_errors, 1);
    assert_eq!(unauthorized, 4);
    assert_eq!(creds.store_count(), 0);
    assert!(!client.refresh_coordinator().is_refreshing());
    // Only the first five attempts; nobody resent with a stale token.
    assert_eq!(server.received_requests().await.unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_waiter_stops_waiting_on_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server).await;

    let creds = creds();
    let refresher = CountingRefresher::new(Duration::from_secs(2));
    let client = client(
        &server,
        Some(AuthOptions::new(creds.clone()).with_refresher(refresher.clone())),
    );

    let initiator = {
        let client = client.clone();
        tokio::spawn(async move { client.get::<Value>("secret", None).await })
    };
    while !client.refresh_coordinator().is_refreshing() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let token = client.cancellation_token();
    let waiter = {
        let client = client.clone();
        let token = token.clone();
        tokio::spawn(async move {
            client
                .get::<Value>("secret", Some(RequestOptions::new().cancel_token(token)))
                .await
        })
    };
    while client.refresh_coordinator().waiter_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    token.cancel();
    let err = tokio::time::timeout(Duration::from_millis(500), waiter)
        .await
        .expect("waiter should return as soon as it is cancelled")
        .unwrap()
        .unwrap_err();
    assert!(err.is_canceled());
    assert!(client.refresh_coordinator().is_refreshing());

    assert_eq!(initiator.await.unwrap().unwrap(), json!({"ok": true}));
    assert_eq!(refresher.calls(), 1);
    assert_eq!(creds.store_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelling_the_initiator_keeps_the_refresh() {
    let server = MockServer::start().await;
    mount_protected(&server).await;

    let creds = creds();
    let refresher = CountingRefresher::new(Duration::from_millis(300));
    let client = client(
        &server,
        Some(AuthOptions::new(creds.clone()).with_refresher(refresher.clone())),
    );

    let token = client.cancellation_token();
    let initiator = {
        let client = client.clone();
        let token = token.clone();
        tokio::spawn(async move {
            client
                .get::<Value>("secret", Some(RequestOptions::new().cancel_token(token)))
                .await
        })
    };
    while !client.refresh_coordinator().is_refreshing() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>("secret", None).await })
        })
        .collect();
    while client.refresh_coordinator().waiter_count() < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    token.cancel();

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap(), json!({"ok": true}));
    }
    let err = initiator.await.unwrap().unwrap_err();
    assert!(err.is_canceled());

    assert_eq!(refresher.calls(), 1);
    assert_eq!(creds.store_count(), 1);
    assert_eq!(creds.access_token().as_deref(), Some("new"));
    assert!(!client.refresh_coordinator().is_refreshing());
    // Four initial 401s plus three retries; the cancelled initiator never resends.
    assert_eq!(server.received_requests().await.unwrap().len(), 7);
}

#[tokio::test]
async fn api_refresher_uses_refresh_endpoint() {
    let server = MockServer::start().await;
    mount_protected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refreshToken": "r-old"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "ok",
            "result": {"accessToken": "new", "refreshToken": "r-new"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let creds = creds();
    let plain = client(&server, None);
    let client = client(
        &server,
        Some(AuthOptions::new(creds.clone()).with_refresher(Arc::new(ApiRefresher::new(&plain)))),
    );

    let reply: Value = client.get("secret", None).await.unwrap();
    assert_eq!(reply, json!({"ok": true}));
    assert_eq!(creds.refresh_token().as_deref(), Some("r-new"));

    let refresh_call = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.url.path() == "/api/auth/refresh")
        .unwrap();
    assert!(refresh_call.headers.get("authorization").is_none());
}

#[tokio::test]
async fn api_refresher_failure_is_normalized() {
    let server = MockServer::start().await;
    mount_protected(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let plain = client(&server, None);
    let client = client(
        &server,
        Some(AuthOptions::new(creds()).with_refresher(Arc::new(ApiRefresher::new(&plain)))),
    );

    let err = client.get::<Value>("secret", None).await.unwrap_err();
    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, "internal server error (500)");
}

// ─────────────────────────────────────────────────────────────────────────────
// Upload / download
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_forces_multipart_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0, "message": "ok", "result": {"id": "f1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, None);
    let options = RequestOptions::new()
        .header("Content-Type", "application/json")
        .unwrap();
    let fields = vec![
        FormField::new("name", "a"),
        FormField::new("file", FormValue::file("notes.txt", b"hello blob".to_vec())),
    ];
    let reply: portico_client::ApiResponse<Value> =
        client.upload("files", fields, Some(options)).await.unwrap();
    assert_eq!(reply.result["id"], "f1");

    let requests = server.received_requests().await.unwrap();
    let content_types: Vec<_> = requests[0]
        .headers
        .get_all("content-type")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(content_types.len(), 1);
    assert!(content_types[0].starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"name\""));
    assert!(body.contains("filename=\"notes.txt\""));
    assert!(body.contains("hello blob"));
}

#[tokio::test]
async fn upload_is_resent_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/files"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/files"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stored": true})))
        .mount(&server)
        .await;

    let client = client(
        &server,
        Some(AuthOptions::new(creds()).with_refresher(CountingRefresher::new(Duration::ZERO))),
    );
    let reply: Value = client
        .upload("files", vec![FormField::new("name", "a")], None)
        .await
        .unwrap();
    assert_eq!(reply, json!({"stored": true}));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(String::from_utf8_lossy(&requests[1].body).contains("name=\"name\""));
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/f1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0u8, 159, 146, 150], "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let client = client(&server, None);
    let blob = client.download("files/f1", None).await.unwrap();
    assert_eq!(blob.bytes(), &[0u8, 159, 146, 150]);
    assert_eq!(blob.content_type(), Some("application/octet-stream"));
    assert_eq!(blob.len(), 4);
}
