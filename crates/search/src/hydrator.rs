//! Hydration of ranked ids into domain records
//!
//! Domain stores answer batch lookups in their own order, so every chunk is
//! re-ordered to match the ranking. Ids without a record of the requested
//! type are dropped without error: the posting lists are shared by all
//! entity types, and a record may also have been deleted since it was
//! ranked.

use agora_core::{DomainRecord, EntityType, OpContext, Result};
use agora_storage::DomainStore;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

/// A domain record in ranked position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Collection the record came from
    pub entity_type: EntityType,
    /// Id the record is stored under
    pub entity_id: String,
    /// The record itself
    pub record: DomainRecord,
}

/// Batch fetches domain records in rank order
#[derive(Clone)]
pub struct Hydrator {
    domain: Arc<dyn DomainStore>,
    batch_size: usize,
}

impl Hydrator {
    /// Fetch at most `batch_size` ids per round-trip (minimum 1)
    pub fn new(domain: Arc<dyn DomainStore>, batch_size: usize) -> Self {
        Hydrator {
            domain,
            batch_size: batch_size.max(1),
        }
    }

    /// Records of `entity_type` for `ids`, in `ids` order.
    ///
    /// Stops fetching once `limit` records are collected (`0` = all).
    pub fn hydrate(
        &self,
        ctx: &OpContext,
        entity_type: EntityType,
        ids: &[String],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::new();
        for chunk in ids.chunks(self.batch_size) {
            ctx.check()?;
            let mut found: FxHashMap<String, DomainRecord> = self
                .domain
                .get_many(entity_type, chunk)?
                .into_iter()
                .collect();
            trace!(
                target: "agora::query",
                entity_type = %entity_type,
                requested = chunk.len(),
                found = found.len(),
                "hydrated chunk"
            );
            for id in chunk {
                if let Some(record) = found.remove(id) {
                    hits.push(SearchHit {
                        entity_type,
                        entity_id: id.clone(),
                        record,
                    });
                    if limit > 0 && hits.len() >= limit {
                        return Ok(hits);
                    }
                }
            }
        }
        Ok(hits)
    }
}
