//! HTTP transport used by generation clients.
//!
//! Clients talk to the network only through [`Transport`], so tests can
//! substitute a stub that records calls instead of sending them.

use crate::error::{parse_retry_after, Result};
use async_trait::async_trait;

/// Header carrying the Google API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// A raw HTTP response as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
    /// `Retry-After` in seconds, when the server sent one.
    pub retry_after: Option<u64>,
}

impl TransportResponse {
    /// Creates a response without a retry hint.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends authenticated requests to the generation service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs a JSON body and returns the response.
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse>;

    /// Issues a GET and returns the response.
    async fn get(&self, url: &str, api_key: &str) -> Result<TransportResponse>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn into_response(response: reqwest::Response) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;
        Ok(TransportResponse {
            status,
            body,
            retry_after,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Self::into_response(response).await
    }

    async fn get(&self, url: &str, api_key: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        Self::into_response(response).await
    }
}
