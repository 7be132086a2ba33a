//! Generation client trait.

use crate::error::Result;
use crate::image::request::EditRequest;
use crate::image::types::GeneratedImage;
use async_trait::async_trait;

/// Outcome of one generation attempt: a result image or an error message.
pub type GenerationResult = Result<GeneratedImage>;

/// Trait for services that apply an edit instruction to an image.
///
/// Implementations make exactly one attempt per call and never retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends the request and returns the first image the service produced.
    async fn generate(&self, request: &EditRequest) -> GenerationResult;

    /// Returns the model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Fails with a configuration error when no credential is available.
    fn check_configuration(&self) -> Result<()>;

    /// Checks if the service is reachable and the credential is accepted.
    async fn health_check(&self) -> Result<()>;
}
