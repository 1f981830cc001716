//! Image providers — hero generation from a text prompt.
//!
//! One trait, three implementations:
//!
//! | Provider | Backend | Network |
//! |---|---|---|
//! | [`MockProvider`] | sha256-derived gradient | none |
//! | [`GeminiDeveloperProvider`](gemini::GeminiDeveloperProvider) | Gemini developer API | `reqwest` blocking |
//! | [`GeminiVertexProvider`](gemini::GeminiVertexProvider) | Vertex AI | `reqwest` blocking |
//!
//! Selection happens exactly once, in [`create_provider`], from the CLI's
//! (provider mode, backend, model) triple. Provider failures are fatal for
//! the product being processed and are never retried here — retry policy
//! belongs to the upstream client, not the orchestrator.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiDeveloperProvider, GeminiVertexProvider};
pub use mock::MockProvider;

use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown provider mode: {0}")]
    UnknownMode(String),
    #[error("Unknown Gemini backend: {0}")]
    UnknownBackend(String),
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
    #[error("Generation request failed for model '{model}': {message}")]
    Request { model: String, message: String },
    #[error("Response from model '{model}' did not contain image data")]
    NoImageData { model: String },
    #[error("Returned image bytes could not be decoded: {0}")]
    Decode(String),
}

/// Produces one base hero image from a text prompt.
pub trait ImageProvider {
    fn generate_hero(
        &self,
        prompt: &str,
        size: (u32, u32),
        negative_prompt: Option<&str>,
    ) -> Result<DynamicImage, ProviderError>;
}

/// Map (provider mode, Gemini backend, model) to one concrete provider.
pub fn create_provider(
    mode: &str,
    backend: &str,
    model: &str,
) -> Result<Box<dyn ImageProvider>, ProviderError> {
    match mode {
        "mock" => Ok(Box::new(MockProvider)),
        "real" => match backend {
            "developer" => Ok(Box::new(GeminiDeveloperProvider::new(model)?)),
            "vertex" => Ok(Box::new(GeminiVertexProvider::new(model)?)),
            other => Err(ProviderError::UnknownBackend(other.to_string())),
        },
        other => Err(ProviderError::UnknownMode(other.to_string())),
    }
}
