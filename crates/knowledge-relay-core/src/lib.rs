//! # Knowledge Relay Core
//!
//! Runtime-agnostic logic for Knowledge Relay: data models, word-window
//! chunking, the in-memory knowledge store, keyword-overlap retrieval,
//! answer composition, and the generation client trait.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies. The
//! application crate supplies text extraction and a concrete
//! [`TextGenerator`](generation::TextGenerator).
//!
//! ```text
//! upload ──▶ chunk ──▶ KnowledgeStore ──▶ retrieve ──▶ compose ──▶ TextGenerator
//!                                                        ▲
//! query ─────────────────────────────────────────────────┘ (QueryRelay skips retrieval)
//! ```

pub mod chunk;
pub mod compose;
pub mod error;
pub mod generation;
pub mod models;
pub mod relay;
pub mod retrieve;
pub mod store;

pub use compose::{Answer, KnowledgeChatbot};
pub use error::{GenerationError, KnowledgeError};
pub use generation::{GenerationOptions, GenerationRequest, TextGenerator};
pub use models::{Document, DocumentKind, DocumentSummary, RetrievalCandidate};
pub use relay::QueryRelay;
pub use store::{KnowledgeStore, Retrieval};
