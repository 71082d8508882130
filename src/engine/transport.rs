use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// One round trip to the chat endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError>;
}

/// JSON-over-HTTP transport against the configured endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Decode a successful body into the reply text.
pub fn decode_reply(body: &str) -> Result<String, TransportError> {
    serde_json::from_str::<ChatReply>(body)
        .map(|reply| reply.response)
        .map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Pull the server's `error` field out of a failure body, if it has one.
pub fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
}

/// Failure for a non-success status. An unreadable body only loses the detail.
pub fn status_error(status: u16, body: Option<&str>) -> TransportError {
    TransportError::Status {
        status,
        detail: body.and_then(error_detail),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<String, TransportError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.ok();
            return Err(status_error(status.as_u16(), body.as_deref()));
        }

        let body = resp.text().await.map_err(classify)?;
        decode_reply(&body)
    }
}
