//! Storage layer for the agora search core
//!
//! This crate implements the backing stores the search core talks to:
//! - SortedSetKv: sorted-set KV seam (posting lists, autocomplete set)
//! - MemoryKv: DashMap-sharded in-memory implementation with pipelines
//! - DocumentStore / MemoryDocumentStore: Search Document Store
//! - DomainStore / MemoryDomainStore: read access to domain collections
//! - testing: fault-injecting wrappers for failure-semantics tests
//!
//! # Consistency
//!
//! Single-key mutations are atomic. Pipelines are one round-trip but are
//! not atomic across keys; callers compensate with idempotent writes and
//! strict write ordering.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod documents;
pub mod domain;
pub mod kv;
pub mod sorted_set;
pub mod testing;

pub use documents::{DocumentStore, MemoryDocumentStore};
pub use domain::{DomainStore, MemoryDomainStore};
pub use kv::{MemoryKv, Pipeline, PipelineReport, SortedSetKv, ZCommand};
pub use sorted_set::{ScoredMember, SortedSet};
