use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ DefaultBodyLimit, State },
    http::{ header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode },
    response::{ IntoResponse, Response },
    routing::any,
    Json,
    Router,
};
use log::{ info, warn, error };
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::cli::RelayArgs;
use crate::error::{ ConfigError, RelayError };

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_RELAY_MAX_TOKENS: u64 = 300;
pub const RAW_BODY_LIMIT: usize = 1000;
const TRUNCATION_MARKER: &str = "... (truncated)";
const REDACTED: &str = "[redacted]";

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Accept, Authorization";

/// Immutable per-process relay settings. Nothing here changes between requests.
#[derive(Clone)]
pub struct RelayConfig {
    pub upstream_url: String,
    pub api_key: String,
    pub model: String,
    pub default_max_tokens: u64,
    /// Echo caller header values in empty-body diagnostics. Names are always listed.
    pub echo_request_headers: bool,
}

impl RelayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            default_max_tokens: DEFAULT_RELAY_MAX_TOKENS,
            echo_request_headers: false,
        }
    }

    pub fn from_args(args: &RelayArgs) -> Result<Self, ConfigError> {
        let api_key = args.openai_api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingCredential("OPENAI_API_KEY"));
        }
        Ok(Self {
            upstream_url: args.upstream_url.clone(),
            api_key: api_key.to_string(),
            model: args.chat_model.clone(),
            default_max_tokens: args.default_max_tokens,
            echo_request_headers: args.echo_request_headers,
        })
    }
}

#[derive(Clone)]
struct RelayState {
    config: Arc<RelayConfig>,
    http: HttpClient,
}

#[derive(Serialize)]
struct UpstreamChatRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: Option<&'a Value>,
    max_tokens: Value,
}

pub fn build_router(config: RelayConfig) -> Router {
    let state = RelayState {
        config: Arc::new(config),
        http: HttpClient::new(),
    };

    let cors = ServiceBuilder::new()
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*")
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS)
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS)
            )
        )
        .layer(
            SetResponseHeaderLayer::if_not_present(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json")
            )
        );

    // No body cap: oversized bodies still get a diagnostic or are forwarded.
    Router::new()
        .route("/", any(relay_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(state)
}

async fn relay_handler(
    State(state): State<RelayState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    info!("Relay request: {} ({} bytes)", method, body.len());

    match relay(&state, &method, &headers, &body).await {
        Ok(upstream_body) => (StatusCode::OK, Json(upstream_body)).into_response(),
        Err(e) => {
            match &e {
                RelayError::EmptyBody { .. } | RelayError::InvalidJson { .. } => {
                    warn!("Rejected relay request: {}", e);
                }
                _ => error!("Relay failed: {}", e),
            }
            e.into_response()
        }
    }
}

async fn relay(
    state: &RelayState,
    method: &Method,
    headers: &HeaderMap,
    body: &[u8]
) -> Result<Value, RelayError> {
    let body_text = String::from_utf8_lossy(body);

    if body_text.is_empty() {
        return Err(RelayError::EmptyBody {
            method: method.to_string(),
            headers: collect_headers(headers, state.config.echo_request_headers),
        });
    }

    let payload = match serde_json::from_str::<Value>(&body_text) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            return Err(RelayError::InvalidJson { raw: truncate_raw(&body_text) });
        }
    };

    let upstream_req = build_upstream_request(&state.config, &payload);

    let resp = state.http
        .post(&state.config.upstream_url)
        .bearer_auth(&state.config.api_key)
        .json(&upstream_req)
        .send().await?;

    let status = resp.status();
    if !status.is_success() {
        // Still relayed as 200; callers inspect the payload.
        warn!("Upstream responded with {}", status);
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice::<Value>(&bytes).map_err(|e|
        RelayError::UpstreamMalformedResponse(format!("{} (status {})", e, status))
    )
}

fn build_upstream_request<'a>(config: &'a RelayConfig, payload: &'a Value) -> UpstreamChatRequest<'a> {
    let max_tokens = match payload.get("max_tokens") {
        Some(Value::Null) | None => Value::from(config.default_max_tokens),
        Some(v) => v.clone(),
    };

    UpstreamChatRequest {
        model: &config.model,
        messages: payload.get("messages"),
        max_tokens,
    }
}

/// Received headers as a name → value map. Repeated headers are joined with ", ".
fn collect_headers(headers: &HeaderMap, echo_values: bool) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();

    for name in headers.keys() {
        let value = if echo_values {
            join_header_values(headers, name)
        } else {
            REDACTED.to_string()
        };
        collected.insert(name.as_str().to_string(), value);
    }

    collected
}

fn join_header_values(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// First `RAW_BODY_LIMIT` characters of the body, with a marker if anything was cut.
pub fn truncate_raw(text: &str) -> String {
    match text.char_indices().nth(RAW_BODY_LIMIT) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
