//! Search Document Store
//!
//! Authoritative copy of the last-indexed [`SearchDoc`] per
//! `(entityType, entityId)`. The indexer diffs new documents against it to
//! compute posting deltas, and reads it back to know which postings to
//! remove on delete. Per-document upsert is atomic.

use agora_core::{DocKey, Result, SearchDoc};
use dashmap::DashMap;

/// Storage for indexed search documents.
///
/// Every method is one round-trip to the document store.
pub trait DocumentStore: Send + Sync {
    /// Last persisted document for `key`
    fn get(&self, key: &DocKey) -> Result<Option<SearchDoc>>;

    /// Upsert by `doc.key()`; replaces rather than duplicates
    fn put(&self, doc: SearchDoc) -> Result<()>;

    /// Remove; returns `true` if a document existed
    fn delete(&self, key: &DocKey) -> Result<bool>;

    /// Every stored document, ordered by key
    fn scan(&self) -> Result<Vec<SearchDoc>>;

    /// Number of stored documents
    fn len(&self) -> Result<usize>;
}

/// In-memory document store backed by a sharded map
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: DashMap<DocKey, SearchDoc>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, key: &DocKey) -> Result<Option<SearchDoc>> {
        Ok(self.docs.get(key).map(|doc| doc.clone()))
    }

    fn put(&self, doc: SearchDoc) -> Result<()> {
        self.docs.insert(doc.key(), doc);
        Ok(())
    }

    fn delete(&self, key: &DocKey) -> Result<bool> {
        Ok(self.docs.remove(key).is_some())
    }

    fn scan(&self) -> Result<Vec<SearchDoc>> {
        let mut docs: Vec<SearchDoc> = self.docs.iter().map(|e| e.value().clone()).collect();
        docs.sort_by(|a, b| {
            (a.entity_type, &a.entity_id).cmp(&(b.entity_type, &b.entity_id))
        });
        Ok(docs)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.docs.len())
    }
}
