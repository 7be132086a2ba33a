//! Image ingestion, edit requests and generation clients.

pub mod ingest;
mod provider;
pub mod providers;
mod request;
mod types;

pub use ingest::{ingest, FileInput, FileSource};
pub use provider::{GenerationClient, GenerationResult};
pub use request::{EditRequest, RequestPart};
pub use types::{
    data_uri, strip_data_uri_prefix, GeneratedImage, ImageFormat, UploadedImage,
    DEFAULT_RESULT_MEDIA_TYPE,
};
