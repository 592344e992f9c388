use async_trait::async_trait;
use log::{ debug, log_enabled, Level };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde_json::Value;
use url::Url;

use crate::error::ClientError;
use crate::models::chat::ChatRequest;

/// The client's view of the relay: post a chat request, get the completion JSON back.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Fails when the transport cannot possibly reach a relay.
    fn ensure_configured(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<Value, ClientError>;
}

pub struct HttpRelayTransport {
    http: HttpClient,
    endpoint: Option<Url>,
}

impl HttpRelayTransport {
    /// An unset endpoint is accepted here and reported when a message is sent.
    pub fn new(relay_url: Option<&str>) -> Result<Self, ClientError> {
        let endpoint = match relay_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(raw) =>
                Some(
                    Url::parse(raw).map_err(|e|
                        ClientError::Configuration(format!("Invalid relay URL '{}': {}", raw, e))
                    )?
                ),
            None => None,
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    fn configured_endpoint(&self) -> Result<&Url, ClientError> {
        self.endpoint.as_ref().ok_or_else(||
            ClientError::Configuration(
                "Relay URL is not defined. Set RELAY_URL or pass --relay-url.".to_string()
            )
        )
    }
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    fn ensure_configured(&self) -> Result<(), ClientError> {
        self.configured_endpoint().map(|_| ())
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<Value, ClientError> {
        let url = self.configured_endpoint()?.clone();

        if log_enabled!(Level::Debug) {
            debug!(
                "Sending relay request body: {}",
                serde_json::to_string(request).unwrap_or_default()
            );
        }

        let resp = self.http.post(url).json(request).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await?;
            return Err(ClientError::UpstreamHttp {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice::<Value>(&bytes).map_err(|e|
            ClientError::MalformedResponse(format!("relay returned non-JSON body: {}", e))
        )
    }
}
