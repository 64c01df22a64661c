//! Agora - search indexing and retrieval core
//!
//! Keeps a keyword index over the marketplace's domain entities (events,
//! places, posts, products, songs, farms and more) and answers queries
//! against it:
//!
//! - change events (`POST`/`PUT`/`PATCH`/`DELETE`) are turned into
//!   normalized search documents and posting-list updates
//! - queries are AND-intersected, or ranked with hashtag boosting when
//!   they mention `#`
//! - ranked ids are hydrated back into domain records
//! - prefix autocomplete runs over every token ever indexed
//!
//! # Crates
//!
//! - [`types`]: shared types (`EntityType`, `ChangeEvent`, `SearchDoc`,
//!   `OpContext`, `Error`)
//! - [`storage`]: sorted-set KV, document and domain store seams with
//!   in-memory implementations
//! - [`search`]: tokenizer, normalizer, indexer, retrieval, worker pool
//!   and the [`SearchCore`] facade
//!
//! # Quick Start
//!
//! ```
//! use agora::{ChangeEvent, DomainRecord, EntityType, Method, SearchConfig, SearchCore};
//! use agora::storage::{MemoryDocumentStore, MemoryDomainStore, MemoryKv};
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
//!     EntityType::FeedPosts,
//!     "p1",
//!     DomainRecord::new().with("Text", "Loving #golang").with("CreatedAt", 10),
//! );
//! let event = ChangeEvent::from_json(br#"{"entityType":"feedposts","entityId":"p1","method":"POST"}"#).unwrap();
//! core.index_data_change(&core.ctx(), &event).unwrap();
//!
//! assert_eq!(core.search_ids("#golang", 10), vec!["p1"]);
//! assert_eq!(core.autocomplete_prefix("lov", 10), vec!["loving"]);
//! ```

pub use agora_core as types;
pub use agora_search as search;
pub use agora_storage as storage;

pub use agora_core::{
    ChangeEvent, DocKey, DomainRecord, EntityType, Error, Method, OpContext, Result, SearchDoc,
    Timestamp,
};
pub use agora_search::{IndexOutcome, IndexWorkerPool, SearchConfig, SearchCore, SearchHit};
