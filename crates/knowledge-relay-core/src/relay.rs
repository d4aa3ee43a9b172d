//! General-purpose query relay.
//!
//! Forwards a user query to the generator under a fixed "expert assistant"
//! system instruction. No ingestion or retrieval is involved.

use std::sync::Arc;

use tracing::warn;

use crate::error::{KnowledgeError, Result};
use crate::generation::{GenerationOptions, GenerationRequest, TextGenerator};

pub const SEARCH_SYSTEM_PROMPT: &str = "You are an expert AI assistant similar to ChatGPT.

Rules:
- Give detailed explanations when asked.
- Give short answers for simple questions.
- Provide examples when helpful.
- Provide code when requested.
- Provide advantages & disadvantages when asked.
- Do not force unnecessary formatting.
- Be natural, clear, and professional.";

pub struct QueryRelay {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
}

impl QueryRelay {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            options: GenerationOptions::SEARCH,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Send `query` to the generator and return its text.
    pub async fn perform_search(&self, query: &str) -> Result<String> {
        if query.trim().is_empty() {
            return Err(KnowledgeError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        let request = GenerationRequest {
            system: Some(SEARCH_SYSTEM_PROMPT.to_string()),
            prompt: query.to_string(),
            options: self.options,
        };
        self.generator.complete(&request).await.map_err(|e| {
            warn!(error = %e, "search generation failed");
            KnowledgeError::from(e)
        })
    }
}
