//! Text extraction for uploaded documents.
//!
//! Each [`DocumentKind`] has its own extraction function. Plain text is
//! decoded as strict UTF-8; paginated documents (PDF) are extracted page by
//! page with `pdf-extract`, each page followed by a newline.
//!
//! Extraction never panics on bad input; failures come back as
//! [`KnowledgeError::Extraction`] or [`KnowledgeError::Decoding`].

use knowledge_relay_core::{DocumentKind, KnowledgeError};

/// Extract plain text from `bytes` according to `kind`.
pub fn extract_text(
    filename: &str,
    kind: DocumentKind,
    bytes: &[u8],
) -> Result<String, KnowledgeError> {
    match kind {
        DocumentKind::PlainText => decode_plain_text(filename, bytes),
        DocumentKind::Paginated => extract_pages(filename, bytes),
    }
}

fn decode_plain_text(filename: &str, bytes: &[u8]) -> Result<String, KnowledgeError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| KnowledgeError::Decoding {
        filename: filename.to_string(),
        reason: e.utf8_error().to_string(),
    })
}

fn extract_pages(filename: &str, bytes: &[u8]) -> Result<String, KnowledgeError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        KnowledgeError::Extraction {
            filename: filename.to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    Ok(text)
}
