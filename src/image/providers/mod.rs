//! Generation service clients.

mod gemini;

pub use gemini::{GeminiClient, GeminiClientBuilder, GeminiModel, DEFAULT_BASE_URL};
