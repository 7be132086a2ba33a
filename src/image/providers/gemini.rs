//! Gemini (Google) image editing client.

use crate::config::{CredentialProvider, EnvCredentials, StaticCredentials};
use crate::error::{sanitize_error_message, EditorError, Result};
use crate::image::provider::{GenerationClient, GenerationResult};
use crate::image::request::{EditRequest, RequestPart};
use crate::image::types::GeneratedImage;
use crate::transport::{HttpTransport, Transport, TransportResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Base URL of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

/// Builder for [`GeminiClient`].
#[derive(Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    credentials: Option<Box<dyn CredentialProvider>>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Without one, `GEMINI_API_KEY` then `GOOGLE_API_KEY` are read.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Replaces the credential lookup entirely.
    pub fn credentials(mut self, credentials: impl CredentialProvider + 'static) -> Self {
        self.credentials = Some(Box::new(credentials));
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds a client that talks HTTP through `reqwest`.
    ///
    /// The credential is not required here; it is checked before each call.
    pub fn build(self) -> GeminiClient<HttpTransport> {
        self.build_with_transport(HttpTransport::new())
    }

    /// Builds a client on top of the given transport.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> GeminiClient<T> {
        let credentials: Box<dyn CredentialProvider> = match (self.api_key, self.credentials) {
            (Some(key), _) => Box::new(StaticCredentials::new(key)),
            (None, Some(credentials)) => credentials,
            (None, None) => Box::new(EnvCredentials::default()),
        };

        GeminiClient {
            transport,
            credentials,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// Gemini image editing client.
pub struct GeminiClient<T = HttpTransport> {
    transport: T,
    credentials: Box<dyn CredentialProvider>,
    model: GeminiModel,
    base_url: String,
}

impl GeminiClient<HttpTransport> {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }
}

impl<T: Transport> GeminiClient<T> {
    fn resolve_api_key(&self) -> Result<String> {
        self.credentials.api_key().ok_or_else(|| {
            EditorError::Configuration(format!(
                "Gemini API key is not configured. Set {}.",
                self.credentials.source()
            ))
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model.as_str())
    }

    async fn generate_impl(&self, request: &EditRequest) -> GenerationResult {
        let api_key = self.resolve_api_key()?;
        let start = Instant::now();

        let url = format!("{}:generateContent", self.model_url());
        let body = serde_json::to_value(GeminiRequest::from_edit_request(request))?;

        tracing::debug!(
            model = self.model.as_str(),
            media_type = %request.image.media_type,
            "submitted edit request"
        );
        let response = self.transport.post_json(&url, &api_key, &body).await?;

        if !response.is_success() {
            return Err(parse_error(&response));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&response.body)?;
        let inline_data = first_inline_image(gemini_response)?;

        let mut image = GeneratedImage::new(inline_data.mime_type, inline_data.data);
        image.model = Some(self.model.as_str().to_string());
        image.duration_ms = Some(start.elapsed().as_millis() as u64);

        tracing::debug!(
            media_type = %image.media_type,
            duration_ms = image.duration_ms,
            "edit complete"
        );
        Ok(image)
    }
}

/// Picks the image out of a response.
///
/// Parts of the first candidate are scanned in order and the first one
/// carrying inline data wins. Anything without such a part is a
/// `NoImageProduced` outcome, with a reason when the service gave one.
fn first_inline_image(response: GeminiResponse) -> Result<InlineData> {
    let block_reason = response.prompt_feedback.and_then(|feedback| {
        feedback.block_reason.map(|reason| {
            feedback
                .block_reason_message
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason))
        })
    });

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(EditorError::NoImageProduced {
            reason: block_reason,
        });
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let mut texts = Vec::new();
    for part in parts {
        // A part with no payload carries no image.
        if let Some(inline_data) = part.inline_data.filter(|d| !d.data.is_empty()) {
            return Ok(inline_data);
        }
        if let Some(text) = part.text {
            texts.push(text);
        }
    }

    if !texts.is_empty() {
        tracing::debug!(text = %texts.join(" "), "model replied without an image");
    }

    let reason = block_reason.or_else(|| {
        candidate
            .finish_reason
            .as_deref()
            .and_then(describe_finish_reason)
    });
    Err(EditorError::NoImageProduced { reason })
}

fn describe_finish_reason(reason: &str) -> Option<String> {
    match reason {
        "SAFETY"
        | "IMAGE_SAFETY"
        | "IMAGE_PROHIBITED_CONTENT"
        | "IMAGE_RECITATION"
        | "RECITATION"
        | "PROHIBITED_CONTENT"
        | "BLOCKLIST" => Some(format!(
            "Content blocked by Gemini safety filter: {}",
            reason
        )),
        _ => None, // STOP, MAX_TOKENS, NO_IMAGE, etc. get the generic hint
    }
}

fn parse_error(response: &TransportResponse) -> EditorError {
    let text = sanitize_error_message(&response.body);
    let message = match response.status {
        401 | 403 => format!("authentication failed: {}", text),
        404 => "Model not found. Verify the model name is correct.".to_string(),
        429 => match response.retry_after {
            Some(secs) => format!("rate limited, retry after {}s", secs),
            None => "rate limited, please wait before trying again".to_string(),
        },
        status if text.is_empty() => format!("API error: {}", status),
        status => format!("API error: {} - {}", status, text),
    };
    EditorError::generation_failed(message)
}

#[async_trait]
impl<T: Transport> GenerationClient for GeminiClient<T> {
    async fn generate(&self, request: &EditRequest) -> GenerationResult {
        let result = self.generate_impl(request).await;
        if let Err(ref e) = result {
            tracing::warn!(kind = e.kind(), "edit attempt failed: {e}");
        }
        result
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }

    fn check_configuration(&self) -> Result<()> {
        self.resolve_api_key().map(|_| ())
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self.resolve_api_key()?;
        let response = self.transport.get(&self.model_url(), &api_key).await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(parse_error(&response))
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        let parts = req
            .parts()
            .into_iter()
            .map(|part| match part {
                RequestPart::InlineImage { media_type, data } => GeminiRequestPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: media_type,
                        data,
                    },
                },
                RequestPart::Text(text) => GeminiRequestPart::Text { text },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}
