//! Image ingestion from picked or dropped files.

use crate::error::{EditorError, Result};
use crate::image::types::{ImageFormat, UploadedImage};
use std::path::Path;

/// Content type declared for files whose type cannot be determined.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// A file handed to the editor: a declared content type plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    /// File name, for display only.
    pub name: String,
    /// Declared content type.
    pub media_type: String,
    /// Binary content.
    pub bytes: Vec<u8>,
}

impl FileInput {
    /// Creates a file input from in-memory parts.
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, declaring its type from the extension or content.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type = declared_media_type(path, &bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, media_type, bytes))
    }
}

/// How a file reached the editor.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Chosen through an explicit file selection.
    Picked(FileInput),
    /// Dropped onto the editor; only the first file is used.
    Dropped(Vec<FileInput>),
}

impl FileSource {
    /// Builds a drop from paths on disk.
    ///
    /// Only the first path is read, since a drop only ever uses its first
    /// file. Later paths are never opened and cannot fail the drop.
    pub fn from_dropped_paths<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = match paths.into_iter().next() {
            Some(path) => vec![FileInput::from_path(path)?],
            None => Vec::new(),
        };
        Ok(Self::Dropped(files))
    }

    /// Normalizes both entry points to a single file.
    ///
    /// Returns `None` for a drop that carried no files.
    pub fn into_file(self) -> Option<FileInput> {
        match self {
            Self::Picked(file) => Some(file),
            Self::Dropped(files) => files.into_iter().next(),
        }
    }
}

/// Validates a file and encodes it for preview and transmission.
pub fn ingest(file: &FileInput) -> Result<UploadedImage> {
    if !file.media_type.starts_with("image/") {
        tracing::debug!(name = %file.name, media_type = %file.media_type, "rejected non-image upload");
        return Err(EditorError::InvalidFileType {
            media_type: file.media_type.clone(),
        });
    }

    let image = UploadedImage::from_bytes(file.media_type.clone(), &file.bytes);
    tracing::debug!(
        name = %file.name,
        media_type = %image.media_type,
        encoded_len = image.encoded_len(),
        "ingested image"
    );
    Ok(image)
}

fn declared_media_type(path: &Path, bytes: &[u8]) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .or_else(|| ImageFormat::from_magic_bytes(bytes))
        .map(|f| f.mime_type().to_string())
        .unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_string())
}
