//! 代理端到端测试：通过 axum 路由驱动请求，上游由 wiremock 模拟

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use translator_key_proxy::{
    config::AppConfig,
    proxy::ForwardingEngine,
    server::{AppState, build_router},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY_HEADER: &str = "ocp-apim-subscription-key";

fn config_for(endpoint: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.endpoint = endpoint.to_string();
    config.upstream.keys = vec!["k1".into(), "k2".into(), "k3".into()];
    config
}

fn router(config: &AppConfig) -> Router {
    let engine = ForwardingEngine::from_config(config).unwrap();
    build_router(AppState::new(Arc::new(engine)), &config.server)
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mock_translate_ok(server: &MockServer) {
    Mock::given(path("/translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "translations": [{ "text": "Hola", "to": "es" }] }
        ])))
        .mount(server)
        .await;
}

async fn received_keys(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            request.headers[KEY_HEADER]
                .to_str()
                .unwrap()
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn health_needs_no_token_and_consumes_no_key() {
    let upstream = MockServer::start().await;
    let mut config = config_for(&upstream.uri());
    config.access.token = Some("s3cret".to_string());
    let app = router(&config);

    let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));
    assert!(upstream.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn keys_rotate_round_robin_across_requests() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let app = router(&config_for(&upstream.uri()));

    for _ in 0..4 {
        let request = post_json("/translate?api-version=3.0&to=es", r#"[{"Text":"Hello"}]"#);
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-proxy-upstream"], "azure-translator");
        assert_eq!(
            body_json(response).await,
            json!([{ "translations": [{ "text": "Hola", "to": "es" }] }])
        );
    }

    assert_eq!(received_keys(&upstream).await, vec!["k1", "k2", "k3", "k1"]);
}

#[tokio::test]
async fn query_and_body_are_forwarded() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let mut config = config_for(&upstream.uri());
    config.upstream.region = Some("westeurope".to_string());
    let app = router(&config);

    send(
        &app,
        post_json("/translate?api-version=3.0&to=es&to=fr", r#"[{"Text":"Hello"}]"#),
    )
    .await;

    let requests = upstream.received_requests().await.unwrap();
    let request = &requests[0];
    assert_eq!(request.method, axum::http::Method::POST);
    assert_eq!(request.url.query(), Some("api-version=3.0&to=es&to=fr"));
    assert_eq!(request.headers["ocp-apim-subscription-region"], "westeurope");
    assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body, json!([{ "Text": "Hello" }]));
}

#[tokio::test]
async fn post_without_body_sends_empty_array() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let app = router(&config_for(&upstream.uri()));

    let response = send(&app, Request::post("/translate").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests[0].body, b"[]".to_vec());
}

#[tokio::test]
async fn get_is_forwarded_without_body() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let app = router(&config_for(&upstream.uri()));

    let response = send(
        &app,
        Request::get("/translate?to%5B%5D=de").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests[0].method, axum::http::Method::GET);
    assert_eq!(requests[0].url.query(), Some("to=de"));
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn form_body_is_forwarded_as_json_object() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let app = router(&config_for(&upstream.uri()));

    let request = Request::post("/translate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("Text=Hello+there"))
        .unwrap();
    send(&app, request).await;

    let requests = upstream.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({ "Text": "Hello there" }));
}

#[tokio::test]
async fn upstream_status_and_text_body_are_relayed() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service busy"))
        .mount(&upstream)
        .await;
    let app = router(&config_for(&upstream.uri()));

    let response = send(&app, post_json("/translate", "[]")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["x-proxy-upstream"], "azure-translator");
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(body_text(response).await, "service busy");
}

#[tokio::test]
async fn upstream_json_error_is_relayed_with_status() {
    let upstream = MockServer::start().await;
    Mock::given(path("/translate"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "code": 401000 } })),
        )
        .mount(&upstream)
        .await;
    let app = router(&config_for(&upstream.uri()));

    let response = send(&app, post_json("/translate", "[]")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-proxy-upstream"], "azure-translator");
    assert_eq!(body_json(response).await, json!({ "error": { "code": 401000 } }));
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway_and_advances_cursor() {
    let config = config_for("http://127.0.0.1:1");
    let engine = Arc::new(ForwardingEngine::from_config(&config).unwrap());
    let app = build_router(AppState::new(engine.clone()), &config.server);

    let response = send(&app, post_json("/translate", "[]")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get("x-proxy-upstream").is_none());

    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad Gateway");
    assert!(body["detail"].as_str().is_some_and(|detail| !detail.is_empty()));

    assert_eq!(engine.key_pool().next().expose(), "k2");
}

#[tokio::test]
async fn slow_upstream_times_out_as_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(path("/translate"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&upstream)
        .await;
    let mut config = config_for(&upstream.uri());
    config.upstream.timeout_seconds = 1;
    let app = router(&config);

    let response = send(&app, post_json("/translate", "[]")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "Bad Gateway");
}

#[tokio::test]
async fn token_policy_guards_translate() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let mut config = config_for(&upstream.uri());
    config.access.token = Some("s3cret".to_string());
    let app = router(&config);

    let response = send(&app, post_json("/translate", "[]")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("x-proxy-upstream").is_none());
    assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));

    let wrong = Request::post("/translate")
        .header("x-proxy-token", "wrong")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);
    assert!(received_keys(&upstream).await.is_empty());

    let bearer = Request::post("/translate")
        .header(header::AUTHORIZATION, "bearer   s3cret ")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, bearer).await.status(), StatusCode::OK);

    let query = Request::get("/translate?accessKey=s3cret&to=es")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, query).await.status(), StatusCode::OK);

    // 被拒绝的请求不消耗密钥
    assert_eq!(received_keys(&upstream).await, vec!["k1", "k2"]);
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() {
    let upstream = MockServer::start().await;
    let app = router(&config_for(&upstream.uri()));

    let response = send(&app, post_json("/translate", "[{\"Text\":")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Bad Request");
    assert!(upstream.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let upstream = MockServer::start().await;
    let mut config = config_for(&upstream.uri());
    config.server.body_limit = 64;
    let app = router(&config);

    let payload = format!(r#"[{{"Text":"{}"}}]"#, "a".repeat(256));
    let response = send(&app, post_json("/translate", &payload)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(upstream.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let upstream = MockServer::start().await;
    let app = router(&config_for(&upstream.uri()));

    let response = send(&app, Request::get("/detect").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let upstream = MockServer::start().await;
    let app = router(&config_for(&upstream.uri()));

    let request = Request::get("/health")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn head_translate_is_forwarded_as_get() {
    let upstream = MockServer::start().await;
    mock_translate_ok(&upstream).await;
    let config = config_for(&upstream.uri());
    let engine = Arc::new(ForwardingEngine::from_config(&config).unwrap());
    let app = build_router(AppState::new(engine.clone()), &config.server);

    let response = send(
        &app,
        Request::head("/translate?to=es").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, axum::http::Method::GET);
    assert_eq!(requests[0].url.query(), Some("to=es"));
    assert!(requests[0].body.is_empty());
    assert_eq!(engine.key_pool().next().expose(), "k2");
}
