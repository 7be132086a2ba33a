//! Core types for image editing.

use crate::error::{EditorError, Result};
use base64::Engine;
use std::path::Path;

/// Media type assumed for result parts that do not declare one.
pub const DEFAULT_RESULT_MEDIA_TYPE: &str = "image/png";

/// Image formats recognised when declaring a file's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
    /// BMP format.
    Bmp,
    /// HEIC/HEIF format.
    Heic,
    /// AVIF format.
    Avif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Heic => "heic",
            Self::Avif => "avif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Heic => "image/heic",
            Self::Avif => "image/avif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "heic" | "heif" => Some(Self::Heic),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            "image/heic" | "image/heif" => Some(Self::Heic),
            "image/avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        if data.starts_with(b"BM") {
            return Some(Self::Bmp);
        }

        // ISO-BMFF: ....ftyp<brand>
        if &data[4..8] == b"ftyp" {
            return match &data[8..12] {
                b"avif" | b"avis" => Some(Self::Avif),
                b"heic" | b"heix" | b"mif1" | b"msf1" => Some(Self::Heic),
                _ => None,
            };
        }

        None
    }
}

/// An image accepted by ingestion and held by the editor session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Base64 payload without any data-URI prefix.
    pub encoded_data: String,
    /// Declared media type, e.g. `image/jpeg`.
    pub media_type: String,
    /// Full data URI used for previewing the upload.
    pub source_uri: String,
}

impl UploadedImage {
    /// Encodes raw bytes under the given media type.
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        let media_type = media_type.into();
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let source_uri = data_uri(&media_type, &encoded);
        let encoded_data = strip_data_uri_prefix(&source_uri).to_string();
        Self {
            encoded_data,
            media_type,
            source_uri,
        }
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.encoded_data.len()
    }
}

/// An image returned by the generation service.
///
/// The payload is kept exactly as received so the rendered URI carries the
/// service's bytes untouched; decoding only happens on download.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated image should be rendered or downloaded"]
pub struct GeneratedImage {
    /// Media type declared by the response part.
    pub media_type: String,
    /// Base64 payload as returned by the service.
    pub encoded_data: String,
    /// Model that produced the image.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

impl GeneratedImage {
    /// Creates a result image, defaulting the media type to PNG when empty.
    pub fn new(media_type: impl Into<String>, encoded_data: impl Into<String>) -> Self {
        let media_type = media_type.into();
        let media_type = if media_type.trim().is_empty() {
            DEFAULT_RESULT_MEDIA_TYPE.to_string()
        } else {
            media_type
        };
        Self {
            media_type,
            encoded_data: encoded_data.into(),
            model: None,
            duration_ms: None,
        }
    }

    /// Returns the renderable data URI.
    pub fn to_data_uri(&self) -> String {
        data_uri(&self.media_type, &self.encoded_data)
    }

    /// Decodes the payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_base64_lenient(&self.encoded_data).map_err(|e| EditorError::Decode(e.to_string()))
    }

    /// Preferred file extension for saving this image.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.media_type)
            .map(|f| f.extension())
            .unwrap_or("png")
    }

    /// Decodes and saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.decode()?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }
}

/// Formats a `data:` URI.
pub fn data_uri(media_type: &str, encoded_data: &str) -> String {
    format!("data:{};base64,{}", media_type, encoded_data)
}

/// Returns the payload after the first comma of a data URI, or the input unchanged.
pub fn strip_data_uri_prefix(uri: &str) -> &str {
    if uri.starts_with("data:") {
        uri.split_once(',').map(|(_, payload)| payload).unwrap_or("")
    } else {
        uri
    }
}

/// Decodes base64 that may carry whitespace or lack padding.
fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = strip_data_uri_prefix(input)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(cleaned.trim_end_matches('='))
}
