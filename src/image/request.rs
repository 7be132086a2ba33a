//! Edit request construction.

use crate::image::types::UploadedImage;

/// One part of an edit request, in the order the model receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    /// Inline binary image data tagged with its media type.
    InlineImage {
        /// Media type of the image.
        media_type: String,
        /// Base64 payload without a data-URI prefix.
        data: String,
    },
    /// Plain-text instruction.
    Text(String),
}

/// An image paired with the instruction describing how to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// The image to edit.
    pub image: UploadedImage,
    /// Free-text edit instruction.
    pub instruction: String,
}

impl EditRequest {
    /// Pairs an image with an instruction.
    ///
    /// No validation happens here; callers only build a request once the
    /// instruction is non-empty.
    pub fn build(image: UploadedImage, instruction: impl Into<String>) -> Self {
        Self {
            image,
            instruction: instruction.into(),
        }
    }

    /// Returns the payload parts: image first, then the instruction.
    pub fn parts(&self) -> [RequestPart; 2] {
        [
            RequestPart::InlineImage {
                media_type: self.image.media_type.clone(),
                data: self.image.encoded_data.clone(),
            },
            RequestPart::Text(self.instruction.clone()),
        ]
    }
}
