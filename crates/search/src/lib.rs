//! Indexing and retrieval for the agora search core
//!
//! This crate provides:
//! - Tokenizer: ASCII word and hashtag tokens, stopwords dropped
//! - Normalizer: per-entity-type projection of domain records
//! - PostingStore / AutocompleteStore: typed views over the sorted-set KV
//! - Indexer: create, delete and delta-update with replay-safe write order
//! - QueryPlan / Retriever: AND intersection and hashtag-boosted ranking
//! - Hydrator: rank-ordered batch fetch of domain records
//! - IndexWorkerPool: bounded queue of change events with retries
//! - Reconciler: repair pass from stored documents to posting lists
//! - SearchCore: facade wiring all of the above, configured by `agora.toml`
//!
//! # Usage
//!
//! ```
//! use agora_core::{ChangeEvent, DomainRecord, EntityType, Method};
//! use agora_search::{SearchConfig, SearchCore};
//! use agora_storage::{MemoryDocumentStore, MemoryDomainStore, MemoryKv};
//! use std::sync::Arc;
//!
//! let domain = Arc::new(MemoryDomainStore::new());
//! let core = SearchCore::new(
//!     Arc::new(MemoryKv::new()),
//!     Arc::new(MemoryDocumentStore::new()),
//!     domain.clone(),
//!     SearchConfig::default(),
//! )
//! .unwrap();
//!
//! domain.insert(
//!     EntityType::Events,
//!     "e1",
//!     DomainRecord::new().with("Title", "Jazz Night").with("Date", 1_000),
//! );
//! let event = ChangeEvent::new(EntityType::Events, "e1", Method::Post);
//! core.index_data_change(&core.ctx(), &event).unwrap();
//!
//! let hits = core.search(EntityType::Events, "jazz", 10);
//! assert_eq!(hits[0].entity_id, "e1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod autocomplete;
pub mod config;
pub mod hydrator;
pub mod indexer;
pub mod normalizer;
pub mod planner;
pub mod postings;
pub mod reconcile;
pub mod retriever;
pub mod service;
pub mod tokenizer;
pub mod worker;

pub use autocomplete::{AutocompleteStore, AUTOCOMPLETE_KEY};
pub use config::{SearchConfig, CONFIG_FILE_NAME};
pub use hydrator::{Hydrator, SearchHit};
pub use indexer::{IndexOutcome, Indexer};
pub use normalizer::{normalize, normalize_named};
pub use planner::QueryPlan;
pub use postings::{PostingBatch, PostingStore};
pub use reconcile::{ReconcileReport, Reconciler};
pub use retriever::{Retriever, ScoredId, HASHTAG_WEIGHT, PLAIN_WEIGHT};
pub use service::SearchCore;
pub use tokenizer::tokenize;
pub use worker::{IndexWorkerPool, PoolOptions, PoolStats};
