//! In-process knowledge store.
//!
//! Holds every ingested [`Document`] in insertion order behind a single
//! `RwLock`. A document's content and chunks are built before the write lock
//! is taken and inserted in one step, so readers never observe a document
//! whose chunks do not match its content.
//!
//! The store is never persisted; a new process starts empty.

use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};
use uuid::Uuid;

use crate::chunk::{chunk_words, DEFAULT_CHUNK_SIZE};
use crate::error::{KnowledgeError, Result};
use crate::models::{Document, DocumentSummary, RetrievalCandidate};
use crate::retrieve::rank;

/// Outcome of a retrieval that distinguishes "no documents" from "no chunks".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// The store holds no documents at all.
    EmptyStore,
    /// Ranked candidates; empty only when every document produced zero chunks.
    Candidates(Vec<RetrievalCandidate>),
}

/// Shared, process-lifetime document store.
pub struct KnowledgeStore {
    chunk_size: NonZeroUsize,
    docs: RwLock<Vec<Document>>,
}

impl KnowledgeStore {
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self {
            chunk_size,
            docs: RwLock::new(Vec::new()),
        }
    }

    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }

    // A panic while holding the lock cannot leave a half-inserted document
    // (insertion is a single push), so poisoned guards are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Document>> {
        self.docs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Document>> {
        self.docs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Chunk already-extracted text and store it as a new document.
    ///
    /// Returns the freshly generated document id.
    pub fn add_text(&self, filename: &str, content: String) -> String {
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            chunks: chunk_words(&content, self.chunk_size),
            content,
        };
        let id = doc.id.clone();
        info!(
            id = %id,
            filename,
            chars = doc.content.chars().count(),
            chunks = doc.chunks.len(),
            "document added"
        );
        self.write().push(doc);
        id
    }

    /// All documents as `{id, filename, size}`, in insertion order.
    pub fn list(&self) -> Vec<DocumentSummary> {
        self.read().iter().map(DocumentSummary::from).collect()
    }

    /// Filenames of all documents, in the same order as [`list`](Self::list).
    pub fn get_sources(&self) -> Vec<String> {
        self.read().iter().map(|d| d.filename.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.read().iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Total number of chunks across all documents.
    pub fn chunk_count(&self) -> usize {
        self.read().iter().map(|d| d.chunks.len()).sum()
    }

    /// Remove one document.
    ///
    /// # Errors
    ///
    /// [`KnowledgeError::NotFound`] if no document has this id.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut docs = self.write();
        let pos = docs
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| KnowledgeError::NotFound(id.to_string()))?;
        let removed = docs.remove(pos);
        info!(id, filename = %removed.filename, "document deleted");
        Ok(())
    }

    /// Remove every document. Succeeds on an empty store.
    pub fn clear(&self) {
        let mut docs = self.write();
        let count = docs.len();
        docs.clear();
        info!(count, "knowledge base cleared");
    }

    /// Rank all chunks against `query` and return the best `top_k`.
    ///
    /// Returns an empty vector for an empty store or a store whose
    /// documents produced no chunks.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<RetrievalCandidate> {
        match self.retrieve(query, top_k) {
            Retrieval::EmptyStore => Vec::new(),
            Retrieval::Candidates(c) => c,
        }
    }

    /// Like [`search`](Self::search) but reports an empty store explicitly.
    ///
    /// The emptiness check and the ranking happen under one read lock.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Retrieval {
        let docs = self.read();
        if docs.is_empty() {
            return Retrieval::EmptyStore;
        }
        let candidates = rank(query, docs.iter(), top_k);
        debug!(
            documents = docs.len(),
            returned = candidates.len(),
            "retrieval complete"
        );
        Retrieval::Candidates(candidates)
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    fn small_store(words_per_chunk: usize) -> KnowledgeStore {
        KnowledgeStore::new(NonZeroUsize::new(words_per_chunk).unwrap())
    }

    #[test]
    fn add_assigns_unique_ids_and_chunks() {
        let store = small_store(2);
        let a = store.add_text("a.txt", "one two three".to_string());
        let b = store.add_text("a.txt", "one two three".to_string());
        assert_ne!(a, b);

        let doc = store.get(&a).unwrap();
        assert_eq!(doc.chunks, vec!["one two", "three"]);
        assert_eq!(doc.content, "one two three");
        assert_eq!(store.chunk_count(), 4);
    }

    #[test]
    fn list_and_sources_follow_insertion_order() {
        let store = KnowledgeStore::default();
        let ids: Vec<String> = ["c.txt", "a.txt", "b.txt"]
            .iter()
            .map(|f| store.add_text(f, format!("content of {}", f)))
            .collect();

        let listed = store.list();
        assert_eq!(
            listed.iter().map(|d| d.id.clone()).collect::<Vec<_>>(),
            ids
        );
        assert_eq!(listed[0].size, "content of c.txt".len());
        assert_eq!(store.get_sources(), vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let store = KnowledgeStore::default();
        store.add_text("a.txt", "alpha".to_string());
        let err = store.delete("missing").unwrap_err();
        assert!(matches!(err, KnowledgeError::NotFound(ref id) if id == "missing"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_removes_only_that_document() {
        let store = KnowledgeStore::default();
        let a = store.add_text("a.txt", "alpha".to_string());
        let b = store.add_text("b.txt", "beta".to_string());
        store.delete(&a).unwrap();
        assert_eq!(store.get_sources(), vec!["b.txt"]);
        assert!(store.get(&b).is_some());
        assert!(store.delete(&a).is_err());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = KnowledgeStore::default();
        store.add_text("a.txt", "alpha".to_string());
        store.clear();
        assert!(store.list().is_empty());
        store.clear();
        assert!(store.list().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn empty_store_search_is_empty() {
        let store = KnowledgeStore::default();
        assert!(store.search("anything", 3).is_empty());
        assert_eq!(store.retrieve("anything", 3), Retrieval::EmptyStore);
    }

    #[test]
    fn chunkless_documents_yield_no_candidates() {
        let store = KnowledgeStore::default();
        store.add_text("blank.txt", "   \n ".to_string());
        assert_eq!(
            store.retrieve("anything", 3),
            Retrieval::Candidates(Vec::new())
        );
    }

    #[test]
    fn delete_then_search_takes_empty_store_path() {
        let store = KnowledgeStore::default();
        let id = store.add_text("only.txt", "some words".to_string());
        store.delete(&id).unwrap();
        assert!(store.search("words", 3).is_empty());
        assert_eq!(store.retrieve("words", 3), Retrieval::EmptyStore);
    }

    #[test]
    fn search_length_is_min_of_k_and_total_chunks() {
        let store = small_store(1);
        store.add_text("a.txt", "a b c".to_string());
        store.add_text("b.txt", "d e".to_string());
        for k in 0..7 {
            assert_eq!(store.search("a", k).len(), k.min(5));
        }
    }

    #[test]
    fn concurrent_adds_and_searches_stay_consistent() {
        let store = Arc::new(small_store(3));
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.add_text(&format!("{}-{}.txt", t, i), format!("w{} x y z q", i));
                    }
                })
            })
            .collect();
        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    for c in store.search("x y", 10) {
                        assert!(c.text.split(' ').count() <= 3);
                    }
                }
            })
        };
        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(store.len(), 100);
        for d in store.list() {
            let doc = store.get(&d.id).unwrap();
            assert_eq!(doc.chunks, chunk_words(&doc.content, store.chunk_size()));
        }
    }
}
