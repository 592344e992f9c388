#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{ Arc, Mutex };

use axum::{
    body::Bytes,
    extract::{ DefaultBodyLimit, State },
    http::{ header, HeaderMap, StatusCode },
    response::IntoResponse,
    routing::post,
    Router,
};
use chat_relay::server::{ build_router, RelayConfig };
use serde_json::Value;

pub const TEST_API_KEY: &str = "sk-test-relay";

/// What the fake upstream saw for one call.
#[derive(Clone, Debug)]
pub struct UpstreamCall {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct UpstreamState {
    status: StatusCode,
    body: &'static str,
    calls: Arc<Mutex<Vec<UpstreamCall>>>,
}

pub struct MockUpstream {
    pub url: String,
    pub calls: Arc<Mutex<Vec<UpstreamCall>>>,
}

impl MockUpstream {
    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn upstream_handler(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
    body: Bytes
) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.calls.lock().unwrap().push(UpstreamCall { authorization, body });

    (state.status, [(header::CONTENT_TYPE, "application/json")], state.body)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Starts a fake chat-completion endpoint answering every call with `status` and `body`.
pub async fn spawn_upstream(status: StatusCode, body: &'static str) -> MockUpstream {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/chat/completions", post(upstream_handler))
        .layer(DefaultBodyLimit::disable())
        .with_state(UpstreamState { status, body, calls: calls.clone() });

    let addr = serve(app).await;
    MockUpstream {
        url: format!("http://{}/v1/chat/completions", addr),
        calls,
    }
}

pub fn relay_config(upstream_url: &str) -> RelayConfig {
    let mut config = RelayConfig::new(TEST_API_KEY);
    config.upstream_url = upstream_url.to_string();
    config
}

/// Runs the relay on a random local port and returns its base URL.
pub async fn spawn_relay(config: RelayConfig) -> String {
    let addr = serve(build_router(config)).await;
    format!("http://{}/", addr)
}
