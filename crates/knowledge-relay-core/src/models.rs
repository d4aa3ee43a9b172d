//! Core data models used throughout Knowledge Relay.
//!
//! These types represent the documents, listings, and retrieval results that
//! flow through the ingestion and question-answering pipeline.

use serde::Serialize;

/// How an upload's bytes are turned into text.
///
/// Determined once from the upload's file extension and carried alongside
/// the raw bytes into the kind-specific extraction function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Decoded directly as UTF-8 (`.txt`).
    PlainText,
    /// Extracted page by page, one newline after each page (`.pdf`).
    Paginated,
}

impl DocumentKind {
    /// Resolve the kind from a filename's extension (case-insensitive).
    ///
    /// Returns `None` for any extension other than `.txt` or `.pdf`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case("txt") {
            Some(DocumentKind::PlainText)
        } else if ext.eq_ignore_ascii_case("pdf") {
            Some(DocumentKind::Paginated)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::PlainText => "text",
            DocumentKind::Paginated => "pdf",
        }
    }
}

/// An ingested document with its derived chunks.
///
/// `chunks` is always `chunk_words(content, chunk_size)`; it is computed once
/// at insertion and never edited on its own.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub chunks: Vec<String>,
}

/// Listing entry for `GET /documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    /// Character length of the extracted content.
    pub size: usize,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            filename: doc.filename.clone(),
            size: doc.content.chars().count(),
        }
    }
}

/// A chunk scored against one query. Recomputed on every search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalCandidate {
    pub text: String,
    /// Filename of the owning document.
    pub source: String,
    /// Number of distinct lowercase words shared with the query.
    pub score: usize,
}
