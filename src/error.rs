//! Error types for image editing.

/// Fallback text when a generation failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image. Please try again.";

/// Maximum length of an upstream error body kept in a user-facing message.
const MAX_ERROR_MESSAGE_LEN: usize = 300;

/// Errors that can occur while ingesting, generating or saving an image.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The selected or dropped file is not an image.
    #[error("Please upload an image file.")]
    InvalidFileType {
        /// Declared content type of the rejected file.
        media_type: String,
    },

    /// No API credential is configured.
    #[error("{0}")]
    Configuration(String),

    /// The service answered normally but returned no image part.
    #[error("No image was generated. {}", .reason.as_deref().unwrap_or("Please try a different prompt."))]
    NoImageProduced {
        /// Why the service declined to produce an image, when it said so.
        reason: Option<String>,
    },

    /// Transport, HTTP or API failure during generation.
    #[error("{0}")]
    GenerationFailed(String),

    /// Download requested while no result image is present.
    #[error("there is no generated image to download")]
    NothingToDownload,

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading an upload, saving a download).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Builds a `GenerationFailed`, substituting the generic text for an empty message.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::GenerationFailed(GENERIC_FAILURE_MESSAGE.to_string())
        } else {
            Self::GenerationFailed(message)
        }
    }

    /// Returns true for the well-formed "no image in the response" outcome.
    pub fn is_no_image(&self) -> bool {
        matches!(self, Self::NoImageProduced { .. })
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFileType { .. } => "invalid_file_type",
            Self::Configuration(_) => "configuration",
            Self::NoImageProduced { .. } => "no_image_produced",
            Self::GenerationFailed(_) => "generation_failed",
            Self::NothingToDownload => "nothing_to_download",
            Self::Decode(_) => "decode",
            Self::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for EditorError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest includes the request URL, which never carries the key here.
        Self::generation_failed(format!("network error: {}", err.without_url()))
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::generation_failed(format!("malformed response: {err}"))
    }
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, EditorError>;

/// Cleans an upstream error body for display.
///
/// Pulls `error.message` out of a JSON error envelope when there is one,
/// redacts anything that looks like a Google API key and truncates the rest.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| text.trim().to_string());

    let redacted = message
        .split(' ')
        .map(|word| {
            if word.contains("AIza") {
                "[REDACTED]"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if redacted.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = redacted.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        redacted
    }
}

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
