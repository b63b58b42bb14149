use http::{HeaderMap, HeaderValue};
use platform_config::PlatformConfig;
use platform_tools_core::{CallContext, TARGET_URL_HEADER, ToolError};
use platform_tools_http::{
    BasicCredentials, Method, PLATFORM_USER_AGENT, PlatformClient, TOOL_NAME_HEADER,
    TransportOptions, check_status,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> PlatformClient {
    PlatformClient::new(&TransportOptions::default(), None).unwrap()
}

fn ctx(base: &str, inbound: HeaderMap) -> CallContext {
    let mut cfg = PlatformConfig::default();
    cfg.service.base_url = base.to_string();
    CallContext::builder(Arc::new(cfg))
        .inbound_headers(inbound)
        .session_id("sess-7")
        .build()
}

fn bearer(token: &'static str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(http::header::AUTHORIZATION, HeaderValue::from_static(token));
    h
}

#[tokio::test]
async fn forwards_inbound_authorization_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .and(header("authorization", "Bearer caller"))
        .and(header("x-session-id", "sess-7"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", PLATFORM_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let me: Value = client()
        .get_json("/api/v1/me", &ctx(&server.uri(), bearer("Bearer caller")))
        .await
        .unwrap();

    assert_eq!(me["id"], "u1");
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn building_a_client_logs_nothing() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let opts = TransportOptions {
            insecure_skip_verify: true,
            ..TransportOptions::default()
        };
        PlatformClient::new(
            &opts,
            Some(BasicCredentials::new("svc", SecretString::from("pw"))),
        )
        .unwrap();
    });

    let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(!logged.contains("WARN"), "unexpected warnings: {logged}");
}

#[tokio::test]
async fn invoking_tool_is_named_on_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header(TOOL_NAME_HEADER, "get_asset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let ctx = ctx(&server.uri(), HeaderMap::new()).with_tool("get_asset", &[]);
    let c = client();
    let _: Value = c.get_json("/a", &ctx).await.unwrap();
    let _: Value = c.get_json("/b", &ctx).await.unwrap();
}

#[tokio::test]
async fn static_credentials_never_follow_an_override_to_another_host() {
    let service = MockServer::start().await;
    let other = MockServer::start().await;
    let c = PlatformClient::new(
        &TransportOptions::default(),
        Some(BasicCredentials::new("svc", SecretString::from("pw"))),
    )
    .unwrap();
    let mut inbound = HeaderMap::new();
    inbound.insert(TARGET_URL_HEADER, HeaderValue::from_str(&other.uri()).unwrap());

    let err = c
        .get_json::<Value>("/api/v1/me", &ctx(&service.uri(), inbound))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Config(_)));
    assert!(other.received_requests().await.unwrap().is_empty());
    assert!(service.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn static_credentials_override_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .and(header("authorization", "Basic c3ZjOnB3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let c = PlatformClient::new(
        &TransportOptions::default(),
        Some(BasicCredentials::new("svc", SecretString::from("pw"))),
    )
    .unwrap();
    let _: Value = c
        .get_json("/api/v1/me", &ctx(&server.uri(), bearer("Bearer caller")))
        .await
        .unwrap();
}

#[tokio::test]
async fn base_path_prefix_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-a/graphql"))
        .and(body_json(json!({"query": "{ ping }", "variables": {}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ping": "pong"}})))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/tenant-a/", server.uri());
    let data: Value = client()
        .graphql("{ ping }", &json!({}), &ctx(&base, HeaderMap::new()))
        .await
        .unwrap();

    assert_eq!(data["ping"], "pong");
}

#[tokio::test]
async fn repeated_slashes_are_collapsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tenant/a/api/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/tenant//a/", server.uri());
    let _: Value = client()
        .get_json("/api//v1/me", &ctx(&base, HeaderMap::new()))
        .await
        .unwrap();
}

#[tokio::test]
async fn override_header_beats_configured_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut inbound = HeaderMap::new();
    inbound.insert(TARGET_URL_HEADER, HeaderValue::from_str(&server.uri()).unwrap());
    let ctx = ctx("http://127.0.0.1:9", inbound);

    let out: Value = client().get_json("/api/v1/me", &ctx).await.unwrap();
    assert_eq!(out["ok"], true);
}

#[tokio::test]
async fn each_request_gets_a_fresh_traceparent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let c = client();
    let ctx = ctx(&server.uri(), HeaderMap::new());
    for _ in 0..3 {
        let _: Value = c.get_json("/ping", &ctx).await.unwrap();
    }

    let received = server.received_requests().await.unwrap();
    let values: HashSet<String> = received
        .iter()
        .map(|r| r.headers["traceparent"].to_str().unwrap().to_string())
        .collect();
    assert_eq!(values.len(), 3);
    for v in &values {
        let parts: Vec<&str> = v.split('-').collect();
        assert_eq!((parts[0], parts[1].len(), parts[2].len(), parts[3]), ("00", 32, 16, "01"));
    }
}

#[tokio::test]
async fn non_success_becomes_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/assets/x"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let err = client()
        .get_json::<Value>("/api/v1/assets/x", &ctx(&server.uri(), HeaderMap::new()))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ToolError::Upstream {
            status: 503,
            kind: "server_error".into(),
            body: "down for maintenance".into(),
        }
    );
}

#[tokio::test]
async fn execute_returns_raw_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/assets/x"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let c = client();
    let req = c.request(Method::DELETE, "api/v1/assets/x").build().unwrap();
    let resp = c
        .execute(&req, &ctx(&server.uri(), HeaderMap::new()))
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 404);
    let err = check_status(resp).await.unwrap_err();
    assert_eq!(err.upstream_status(), Some(404));
}

#[tokio::test]
async fn missing_target_fails_before_sending() {
    let err = client()
        .get_json::<Value>("/api/v1/me", &ctx("", HeaderMap::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Config(_)));
}

#[tokio::test]
async fn cancellation_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut cfg = PlatformConfig::default();
    cfg.service.base_url = server.uri();
    let token = CancellationToken::new();
    let ctx = CallContext::builder(Arc::new(cfg))
        .cancellation(token.clone())
        .build();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = client().get_json::<Value>("/slow", &ctx).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, ToolError::Cancelled(_)));
}
