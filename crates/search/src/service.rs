//! Search core facade
//!
//! [`SearchCore`] wires the indexer, retriever, hydrator and autocomplete
//! store over three injected store handles and exposes the public
//! operations. It holds no mutable state of its own; clones of the handles
//! may be shared freely between threads.
//!
//! Query methods come in two flavours: `try_*` returns the error, the plain
//! form logs it and answers with an empty result.

use crate::autocomplete::AutocompleteStore;
use crate::config::SearchConfig;
use crate::hydrator::{Hydrator, SearchHit};
use crate::indexer::{IndexOutcome, Indexer};
use crate::planner::QueryPlan;
use crate::postings::PostingStore;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::retriever::Retriever;
use crate::worker::IndexWorkerPool;
use agora_core::{ChangeEvent, DocKey, EntityType, OpContext, Result, SearchDoc};
use agora_storage::{DocumentStore, DomainStore, SortedSetKv};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// The search indexing and retrieval core
#[derive(Clone)]
pub struct SearchCore {
    config: SearchConfig,
    postings: PostingStore,
    autocomplete: AutocompleteStore,
    docs: Arc<dyn DocumentStore>,
    indexer: Indexer,
    retriever: Retriever,
    hydrator: Hydrator,
}

impl SearchCore {
    /// Build the core over its backing stores.
    ///
    /// Fails with `InvalidConfig` if `config` does not validate.
    pub fn new(
        kv: Arc<dyn SortedSetKv>,
        docs: Arc<dyn DocumentStore>,
        domain: Arc<dyn DomainStore>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        let postings = PostingStore::new(Arc::clone(&kv));
        let autocomplete = AutocompleteStore::new(kv);
        let indexer = Indexer::new(
            postings.clone(),
            autocomplete.clone(),
            Arc::clone(&docs),
            Arc::clone(&domain),
        );
        Ok(SearchCore {
            retriever: Retriever::new(postings.clone()),
            hydrator: Hydrator::new(domain, config.hydrate_batch_size),
            config,
            postings,
            autocomplete,
            docs,
            indexer,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fresh operation context carrying the configured deadline
    pub fn ctx(&self) -> OpContext {
        match self.config.op_timeout() {
            Some(timeout) => OpContext::with_timeout(timeout),
            None => OpContext::background(),
        }
    }

    /// The underlying indexer
    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    // ========================================================================
    // Indexing
    // ========================================================================

    /// Apply one change event synchronously.
    pub fn index_data_change(&self, ctx: &OpContext, event: &ChangeEvent) -> Result<IndexOutcome> {
        self.indexer.index_data_change(ctx, event)
    }

    /// Index a new document.
    pub fn index_entity(&self, ctx: &OpContext, doc: SearchDoc) -> Result<IndexOutcome> {
        self.indexer.index_entity(ctx, doc)
    }

    /// Re-index a changed document.
    pub fn update_entity_indexes(&self, ctx: &OpContext, doc: SearchDoc) -> Result<IndexOutcome> {
        self.indexer.update_entity_indexes(ctx, doc)
    }

    /// Remove an entity from the index; unknown entities succeed.
    pub fn delete_entity(
        &self,
        ctx: &OpContext,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<IndexOutcome> {
        self.indexer
            .delete_entity(ctx, &DocKey::new(entity_type, entity_id))
    }

    /// Start a worker pool for asynchronous event delivery, sized from the
    /// configuration.
    pub fn start_workers(&self) -> Result<IndexWorkerPool> {
        IndexWorkerPool::start(self.indexer.clone(), self.config.pool_options())
    }

    /// Run one reconciliation pass over all stored documents.
    pub fn reconcile(&self, ctx: &OpContext) -> Result<ReconcileReport> {
        Reconciler::new(
            self.postings.clone(),
            self.autocomplete.clone(),
            Arc::clone(&self.docs),
        )
        .run(ctx)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Ranked records of one entity type; empty on any failure.
    pub fn search(&self, entity_type: EntityType, query: &str, limit: usize) -> Vec<SearchHit> {
        self.try_search(&self.ctx(), entity_type, query, limit)
            .unwrap_or_else(|e| {
                log_query_error("search", query, &e);
                Vec::new()
            })
    }

    /// Ranked records of one entity type.
    ///
    /// Ids are ranked across all types, then hydrated against this type's
    /// collection until `limit` records are found.
    pub fn try_search(
        &self,
        ctx: &OpContext,
        entity_type: EntityType,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let plan = QueryPlan::parse(query)?;
        let ids = self.retriever.retrieve(ctx, &plan, 0)?;
        let hits = self
            .hydrator
            .hydrate(ctx, entity_type, &ids, self.config.effective_limit(limit))?;
        debug!(
            target: "agora::query",
            plan = plan.kind(),
            entity_type = %entity_type,
            candidates = ids.len(),
            hits = hits.len(),
            "search"
        );
        Ok(hits)
    }

    /// Ranked records of every type that has any; empty on any failure.
    pub fn search_all(&self, query: &str, limit: usize) -> BTreeMap<EntityType, Vec<SearchHit>> {
        self.try_search_all(&self.ctx(), query, limit)
            .unwrap_or_else(|e| {
                log_query_error("search_all", query, &e);
                BTreeMap::new()
            })
    }

    /// Ranked records per entity type, omitting types with no hits.
    ///
    /// Ids are ranked once; every type's collection is hydrated in
    /// parallel. `limit` applies per type.
    pub fn try_search_all(
        &self,
        ctx: &OpContext,
        query: &str,
        limit: usize,
    ) -> Result<BTreeMap<EntityType, Vec<SearchHit>>> {
        let plan = QueryPlan::parse(query)?;
        let ids = self.retriever.retrieve(ctx, &plan, 0)?;
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let limit = self.config.effective_limit(limit);
        let per_type: Vec<(EntityType, Vec<SearchHit>)> = EntityType::ALL
            .as_slice()
            .par_iter()
            .map(|&entity_type| {
                self.hydrator
                    .hydrate(ctx, entity_type, &ids, limit)
                    .map(|hits| (entity_type, hits))
            })
            .collect::<Result<_>>()?;
        Ok(per_type
            .into_iter()
            .filter(|(_, hits)| !hits.is_empty())
            .collect())
    }

    /// Ranked ids without hydration; empty on any failure.
    pub fn search_ids(&self, query: &str, limit: usize) -> Vec<String> {
        self.try_search_ids(&self.ctx(), query, limit)
            .unwrap_or_else(|e| {
                log_query_error("search_ids", query, &e);
                Vec::new()
            })
    }

    /// Ranked ids without hydration.
    pub fn try_search_ids(&self, ctx: &OpContext, query: &str, limit: usize) -> Result<Vec<String>> {
        let plan = QueryPlan::parse(query)?;
        self.retriever
            .retrieve(ctx, &plan, self.config.effective_limit(limit))
    }

    /// Indexed tokens starting with `prefix`; empty on any failure.
    pub fn autocomplete_prefix(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.try_autocomplete_prefix(&self.ctx(), prefix, limit)
            .unwrap_or_else(|e| {
                log_query_error("autocomplete", prefix, &e);
                Vec::new()
            })
    }

    /// Indexed tokens starting with `prefix`, lexicographic.
    pub fn try_autocomplete_prefix(
        &self,
        ctx: &OpContext,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.autocomplete
            .prefix(ctx, prefix, self.config.effective_limit(limit))
    }
}

fn log_query_error(op: &'static str, query: &str, e: &agora_core::Error) {
    error!(
        target: "agora::query",
        op,
        query,
        error = %e,
        "query failed, returning empty result"
    );
}
