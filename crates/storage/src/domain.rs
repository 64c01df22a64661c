//! Domain store interface
//!
//! Domain entities are owned by other subsystems. The search core only
//! needs to resolve `(entityType, entityId)` to a record, one at a time
//! when indexing and in batches when hydrating query results.

use agora_core::{DocKey, DomainRecord, EntityType, Result};
use dashmap::DashMap;

/// Read access to domain collections.
pub trait DomainStore: Send + Sync {
    /// Fetch one record; `Ok(None)` when it does not exist
    fn get(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<DomainRecord>>;

    /// Fetch many records of one type in a single round-trip.
    ///
    /// Returns `(id, record)` pairs in no particular order; missing ids
    /// are omitted.
    fn get_many(
        &self,
        entity_type: EntityType,
        entity_ids: &[String],
    ) -> Result<Vec<(String, DomainRecord)>> {
        let mut found = Vec::with_capacity(entity_ids.len());
        for id in entity_ids {
            if let Some(record) = self.get(entity_type, id)? {
                found.push((id.clone(), record));
            }
        }
        Ok(found)
    }
}

/// In-memory domain collections, one logical collection per entity type
#[derive(Debug, Default)]
pub struct MemoryDomainStore {
    records: DashMap<DocKey, DomainRecord>,
}

impl MemoryDomainStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub fn insert(&self, entity_type: EntityType, entity_id: impl Into<String>, record: DomainRecord) {
        self.records
            .insert(DocKey::new(entity_type, entity_id), record);
    }

    /// Remove a record; returns it if present
    pub fn remove(&self, entity_type: EntityType, entity_id: &str) -> Option<DomainRecord> {
        self.records
            .remove(&DocKey::new(entity_type, entity_id))
            .map(|(_, record)| record)
    }

    /// Number of records across all collections
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether every collection is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DomainStore for MemoryDomainStore {
    fn get(&self, entity_type: EntityType, entity_id: &str) -> Result<Option<DomainRecord>> {
        Ok(self
            .records
            .get(&DocKey::new(entity_type, entity_id))
            .map(|r| r.clone()))
    }

    /// Returns matches sorted by id, which is generally not the caller's
    /// order.
    fn get_many(
        &self,
        entity_type: EntityType,
        entity_ids: &[String],
    ) -> Result<Vec<(String, DomainRecord)>> {
        let mut found: Vec<(String, DomainRecord)> = entity_ids
            .iter()
            .filter_map(|id| {
                self.records
                    .get(&DocKey::new(entity_type, id.clone()))
                    .map(|r| (id.clone(), r.clone()))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found.dedup_by(|a, b| a.0 == b.0);
        Ok(found)
    }
}
