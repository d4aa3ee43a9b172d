//! Error taxonomy shared by every core operation.

use thiserror::Error;

/// Failure of a knowledge-base or relay operation.
///
/// Every variant carries enough detail to render a user-facing message at
/// the request boundary. No variant is ever produced after a partial store
/// mutation.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Malformed request: empty query, disallowed file extension.
    #[error("{0}")]
    Validation(String),
    /// A paginated document could not be turned into text.
    #[error("Failed to extract text from {filename}: {reason}")]
    Extraction { filename: String, reason: String },
    /// Plain-text upload is not valid UTF-8.
    #[error("Failed to decode {filename} as UTF-8: {reason}")]
    Decoding { filename: String, reason: String },
    #[error("Document {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Failure of the external text-completion call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation API key is not configured")]
    MissingApiKey,
    #[error("request to generation API failed: {0}")]
    Transport(String),
    #[error("generation API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
    #[error("generation was blocked: {0}")]
    Blocked(String),
}

pub type Result<T, E = KnowledgeError> = std::result::Result<T, E>;
