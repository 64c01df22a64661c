//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's
//! main.rs.

#![allow(dead_code)]

use agora_core::{DomainRecord, EntityType, OpContext, SearchDoc, Timestamp};
use agora_search::{PostingStore, Retriever, SearchConfig, SearchCore};
use agora_storage::testing::{FaultyDocumentStore, FaultyKv};
use agora_storage::{MemoryDocumentStore, MemoryDomainStore, MemoryKv, SortedSetKv};
use std::collections::BTreeMap;
use std::sync::{Arc, Once};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route warnings and errors to the test writer, once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::WARN)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Harness - SearchCore over fault-injectable in-memory stores
// ============================================================================

/// A search core plus direct handles to every store behind it.
pub struct Harness {
    pub core: SearchCore,
    pub kv: Arc<FaultyKv<MemoryKv>>,
    pub docs: Arc<FaultyDocumentStore<MemoryDocumentStore>>,
    pub domain: Arc<MemoryDomainStore>,
}

impl Harness {
    /// Harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    /// Harness with a custom configuration.
    pub fn with_config(config: SearchConfig) -> Self {
        init_tracing();
        let kv = Arc::new(FaultyKv::new(Arc::new(MemoryKv::new())));
        let docs = Arc::new(FaultyDocumentStore::new(Arc::new(MemoryDocumentStore::new())));
        let domain = Arc::new(MemoryDomainStore::new());
        let core = SearchCore::new(kv.clone(), docs.clone(), domain.clone(), config)
            .expect("valid test config");
        Harness {
            core,
            kv,
            docs,
            domain,
        }
    }

    /// Context without deadline.
    pub fn ctx(&self) -> OpContext {
        OpContext::background()
    }

    /// Index a document directly and register a matching domain record so
    /// hydration finds it.
    pub fn index(&self, doc: SearchDoc) {
        self.register(&doc);
        self.core
            .index_entity(&self.ctx(), doc)
            .expect("index_entity");
    }

    /// Update a document directly, keeping the domain record in step.
    pub fn update(&self, doc: SearchDoc) {
        self.register(&doc);
        self.core
            .update_entity_indexes(&self.ctx(), doc)
            .expect("update_entity_indexes");
    }

    /// Delete directly.
    pub fn delete(&self, entity_type: EntityType, entity_id: &str) {
        self.domain.remove(entity_type, entity_id);
        self.core
            .delete_entity(&self.ctx(), entity_type, entity_id)
            .expect("delete_entity");
    }

    /// Ranked ids for a query, unlimited.
    pub fn ids(&self, query: &str) -> Vec<String> {
        self.core
            .try_search_ids(&self.ctx(), query, 0)
            .expect("search_ids")
    }

    /// Retriever over the same posting lists, for score inspection.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(PostingStore::new(self.kv.clone()))
    }

    /// Every key in the KV store with its members and scores.
    pub fn kv_state(&self) -> BTreeMap<String, Vec<(String, i64)>> {
        kv_state(self.kv.inner())
    }

    fn register(&self, doc: &SearchDoc) {
        let record = DomainRecord::new()
            .with("Title", doc.title.clone())
            .with("Description", doc.description.clone())
            .with("CreatedAt", doc.created_at.as_millis());
        self.domain
            .insert(doc.entity_type, doc.entity_id.clone(), record);
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// A search document with `created_at` in epoch milliseconds.
pub fn doc(entity_type: EntityType, id: &str, title: &str, description: &str, millis: i64) -> SearchDoc {
    SearchDoc::new(
        entity_type,
        id,
        title,
        description,
        Timestamp::from_millis(millis),
    )
}

/// Snapshot of every sorted set in a KV store.
pub fn kv_state(kv: &MemoryKv) -> BTreeMap<String, Vec<(String, i64)>> {
    kv.keys_with_prefix("")
        .expect("list keys")
        .into_iter()
        .map(|key| {
            let members = kv
                .zrevrange(&key, 0)
                .expect("read set")
                .into_iter()
                .map(|m| (m.member, m.score))
                .collect();
            (key, members)
        })
        .collect()
}

/// Owned strings from literals.
pub fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
