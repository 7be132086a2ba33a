#![warn(missing_docs)]
//! promptedit - edit images with natural-language instructions.
//!
//! Upload an image, describe the change, and get back the image produced by
//! Google's Gemini image models.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptedit::{EditorSession, FileInput, FileSource, GeminiClient, Phase};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> promptedit::Result<()> {
//!     let client = GeminiClient::builder().build();
//!
//!     let mut session = EditorSession::new();
//!     session.upload(FileSource::Picked(FileInput::from_path("cat.jpg")?));
//!     session.set_prompt("make it a watercolor painting");
//!     session.generate(&client).await;
//!
//!     match session.phase() {
//!         Phase::Done(_) => {
//!             session.download("edited-image.png")?;
//!         }
//!         _ => eprintln!("{}", session.message().unwrap_or("nothing generated")),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! The API key is read from `GEMINI_API_KEY`, then `GOOGLE_API_KEY`, unless one
//! is passed to [`GeminiClientBuilder::api_key`] or a custom
//! [`CredentialProvider`] is supplied.

pub mod config;
mod error;
pub mod image;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export error types at crate root
pub use error::{EditorError, Result, GENERIC_FAILURE_MESSAGE};

pub use config::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use image::providers::{GeminiClient, GeminiClientBuilder, GeminiModel};
pub use image::{
    EditRequest, FileInput, FileSource, GeneratedImage, GenerationClient, GenerationResult,
    ImageFormat, UploadedImage,
};
pub use session::{EditorSession, Failure, Phase, UploadOutcome, DEFAULT_DOWNLOAD_FILENAME};
pub use transport::{HttpTransport, Transport, TransportResponse};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{EditorError, Result};
    pub use crate::image::{FileInput, FileSource, GenerationClient};
    pub use crate::image::providers::GeminiClient;
    pub use crate::session::{EditorSession, Phase};
}
