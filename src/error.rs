use std::collections::BTreeMap;

use axum::{
    http::{ header, HeaderValue, StatusCode },
    response::{ IntoResponse, Response },
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the relay to its caller.
///
/// Every variant carries the diagnostic detail that ends up in the response body.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Empty body received")]
    EmptyBody {
        method: String,
        headers: BTreeMap<String, String>,
    },

    #[error("Invalid JSON body")]
    InvalidJson {
        raw: String,
    },

    #[error("Upstream request failed: {0}")]
    UpstreamHttp(#[from] reqwest::Error),

    #[error("Upstream returned a malformed response: {0}")]
    UpstreamMalformedResponse(String),
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::EmptyBody { .. } => "empty_body",
            RelayError::InvalidJson { .. } => "invalid_json",
            RelayError::UpstreamHttp(_) => "upstream_http_error",
            RelayError::UpstreamMalformedResponse(_) => "upstream_malformed_response",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::EmptyBody { .. } | RelayError::InvalidJson { .. } => StatusCode::BAD_REQUEST,
            RelayError::UpstreamHttp(_) | RelayError::UpstreamMalformedResponse(_) =>
                StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RelayError::EmptyBody { method, headers } =>
                json!({
                    "error": "Empty body received",
                    "method": method,
                    "headers": headers,
                }),
            RelayError::InvalidJson { raw } => json!({ "error": "Invalid JSON body", "raw": raw }),
            RelayError::UpstreamHttp(e) =>
                json!({ "error": "Upstream request failed", "detail": e.to_string() }),
            RelayError::UpstreamMalformedResponse(detail) =>
                json!({ "error": "Upstream returned a malformed response", "detail": detail }),
        };

        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Failures of a single client submission. Caught at the submission boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Relay error: {status} {status_text} - {body}")]
    UpstreamHttp {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Malformed relay response: {0}")]
    MalformedResponse(String),

    #[error("Relay transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Startup configuration that cannot work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set. Provide it via the environment or the matching command-line flag.")]
    MissingCredential(&'static str),
}

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Persona file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persona JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
