//! Generation client abstraction.
//!
//! The external text-completion service is opaque to the core: given a
//! prompt, an optional system instruction, and sampling options it returns
//! generated text or fails. Implementations must be `Send + Sync` and must
//! not block the async executor while waiting on the network.

use async_trait::async_trait;

use crate::error::GenerationError;

/// Sampling knobs forwarded to the completion API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl GenerationOptions {
    /// Low-temperature settings used for knowledge-base answers.
    pub const CHATBOT: GenerationOptions = GenerationOptions {
        temperature: 0.3,
        max_output_tokens: 600,
        top_p: None,
        top_k: None,
    };

    /// Settings used for general-purpose search queries.
    pub const SEARCH: GenerationOptions = GenerationOptions {
        temperature: 0.7,
        max_output_tokens: 2048,
        top_p: Some(0.95),
        top_k: None,
    };
}

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instruction, sent separately from the user turn.
    pub system: Option<String>,
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Boundary adapter to an external text-completion capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier reported by status endpoints.
    fn model_name(&self) -> &str;

    /// Whether the generator has the credentials it needs to make calls.
    fn is_configured(&self) -> bool {
        true
    }

    /// Generate text for `request`. No retries are performed.
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
