//! Test doubles shared by unit tests.

use crate::error::{EditorError, Result};
use crate::transport::{Transport, TransportResponse};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// What the stub answers with.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Response(TransportResponse),
    NetworkError(String),
}

/// A request seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub api_key: String,
    pub body: Option<serde_json::Value>,
}

/// Transport stub that records every call and replays a canned reply.
#[derive(Debug, Clone)]
pub(crate) struct RecordingTransport {
    reply: Reply,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl RecordingTransport {
    pub fn replying(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Reply::Response(TransportResponse::new(status, body)),
            calls: Arc::default(),
        }
    }

    pub fn with_json(body: serde_json::Value) -> Self {
        Self::replying(200, body.to_string())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Reply::NetworkError(message.into()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer(&self, call: RecordedCall) -> Result<TransportResponse> {
        self.calls.lock().unwrap().push(call);
        match &self.reply {
            Reply::Response(response) => Ok(response.clone()),
            Reply::NetworkError(message) => Err(EditorError::generation_failed(message.clone())),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        self.answer(RecordedCall {
            url: url.to_string(),
            api_key: api_key.to_string(),
            body: Some(body.clone()),
        })
    }

    async fn get(&self, url: &str, api_key: &str) -> Result<TransportResponse> {
        self.answer(RecordedCall {
            url: url.to_string(),
            api_key: api_key.to_string(),
            body: None,
        })
    }
}

/// A Gemini response whose only part is inline image data.
pub(crate) fn image_response(mime_type: &str, data: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{ "inlineData": { "mimeType": mime_type, "data": data } }]
            },
            "finishReason": "STOP"
        }]
    })
}

/// A Gemini response carrying only text.
pub(crate) fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
