//! Upload ingestion.
//!
//! Coordinates the upload flow: extension check → extraction → chunking →
//! storage. The extension is validated before any bytes are inspected, and
//! the store is only touched once extraction has succeeded, so a failed
//! upload leaves no trace.

use std::sync::Arc;

use knowledge_relay_core::{DocumentKind, KnowledgeError, KnowledgeStore};
use tracing::{info, warn};

use crate::extract::extract_text;

/// Resolve the document kind for an upload or reject it.
pub fn kind_for(filename: &str) -> Result<DocumentKind, KnowledgeError> {
    DocumentKind::from_filename(filename).ok_or_else(|| {
        KnowledgeError::Validation("Only PDF and TXT files are supported".to_string())
    })
}

/// Extract, chunk, and store one upload. Returns the new document id.
pub fn add_document(
    store: &KnowledgeStore,
    filename: &str,
    bytes: &[u8],
) -> Result<String, KnowledgeError> {
    let kind = kind_for(filename)?;
    let text = extract_text(filename, kind, bytes).inspect_err(|e| {
        warn!(filename, kind = kind.as_str(), error = %e, "extraction failed");
    })?;
    info!(filename, kind = kind.as_str(), bytes = bytes.len(), "extracted upload");
    Ok(store.add_text(filename, text))
}

/// [`add_document`] on the blocking pool.
///
/// PDF extraction is CPU-bound and may panic on hostile input; a panic is
/// reported as an extraction failure instead of tearing down the request.
pub async fn add_document_blocking(
    store: Arc<KnowledgeStore>,
    filename: String,
    bytes: Vec<u8>,
) -> Result<String, KnowledgeError> {
    kind_for(&filename)?;
    let name = filename.clone();
    tokio::task::spawn_blocking(move || add_document(&store, &filename, &bytes))
        .await
        .map_err(|e| KnowledgeError::Extraction {
            filename: name,
            reason: format!("extractor aborted: {}", e),
        })?
}
