//! Indexer
//!
//! Applies create, update and delete to the posting lists, the search
//! document store and the autocomplete set.
//!
//! # Write ordering
//!
//! Nothing here is transactional. Each operation orders its writes so that
//! a failure at any point leaves state that replaying the same operation
//! repairs:
//!
//! | operation | first                 | then                  |
//! |-----------|-----------------------|-----------------------|
//! | index     | persist SearchDoc     | posting batch         |
//! | update    | posting batch (delta) | persist SearchDoc     |
//! | delete    | posting batch (all)   | delete SearchDoc      |
//!
//! Updates diff against the *stored* document, so the stored document must
//! only move forward once its postings have. Deletes read the stored
//! document to know which postings to remove, so it must outlive them.

use crate::autocomplete::AutocompleteStore;
use crate::normalizer::normalize;
use crate::postings::{PostingBatch, PostingStore};
use crate::tokenizer::tokenize;
use agora_core::{
    ChangeEvent, DocKey, EntityType, Error, Method, OpContext, RawChangeEvent, Result, SearchDoc,
};
use agora_storage::{DocumentStore, DomainStore};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What an indexing call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Document stored and its postings added
    Indexed {
        /// Distinct tokens posted
        tokens: usize,
    },
    /// Posting delta applied and document replaced
    Updated {
        /// Tokens newly posted
        added: usize,
        /// Tokens no longer posted
        removed: usize,
    },
    /// Token set and score unchanged; only the stored document was replaced
    Unchanged,
    /// Postings and document removed
    Deleted {
        /// Tokens whose postings were removed
        tokens: usize,
    },
    /// Nothing to do: the entity does not exist
    Skipped,
}

/// Index maintenance over the posting, document and autocomplete stores
#[derive(Clone)]
pub struct Indexer {
    postings: PostingStore,
    autocomplete: AutocompleteStore,
    docs: Arc<dyn DocumentStore>,
    domain: Arc<dyn DomainStore>,
}

impl Indexer {
    /// Create an indexer over the given stores
    pub fn new(
        postings: PostingStore,
        autocomplete: AutocompleteStore,
        docs: Arc<dyn DocumentStore>,
        domain: Arc<dyn DomainStore>,
    ) -> Self {
        Indexer {
            postings,
            autocomplete,
            docs,
            domain,
        }
    }

    /// Index a document that has not been indexed before.
    ///
    /// Persists the document, then posts every token of
    /// `title + " " + description` with score `created_at` and adds the
    /// tokens to the autocomplete set, all in one pipeline.
    pub fn index_entity(&self, ctx: &OpContext, doc: SearchDoc) -> Result<IndexOutcome> {
        let tokens = tokenize(&doc.indexed_text());
        let score = doc.created_at.as_nanos();
        let key = doc.key();

        let namesakes = self.namesakes(ctx, &key)?;
        ctx.check()?;
        self.docs.put(doc)?;

        let mut batch = self.postings.batch();
        for token in &tokens {
            batch.add_posting(token, &key.entity_id, namesakes.score(token, score));
            self.autocomplete.queue_token(&mut batch, token);
        }
        self.postings.commit(ctx, batch)?;

        debug!(
            target: "agora::index",
            entity_type = %key.entity_type,
            entity_id = %key.entity_id,
            tokens = tokens.len(),
            "entity indexed"
        );
        Ok(IndexOutcome::Indexed {
            tokens: tokens.len(),
        })
    }

    /// Bring the index in line with a new version of a document.
    ///
    /// Without a stored prior version this is [`Indexer::index_entity`].
    /// Otherwise only the token delta is written. When the creation time
    /// moved, retained tokens are re-posted so every posting keeps scoring
    /// with the document's current `created_at`.
    pub fn update_entity_indexes(&self, ctx: &OpContext, doc: SearchDoc) -> Result<IndexOutcome> {
        ctx.check()?;
        let old = match self.docs.get(&doc.key())? {
            Some(old) => old,
            None => return self.index_entity(ctx, doc),
        };

        let old_tokens = tokenize(&old.indexed_text());
        let new_tokens = tokenize(&doc.indexed_text());
        let old_set: FxHashSet<&str> = old_tokens.iter().map(String::as_str).collect();
        let new_set: FxHashSet<&str> = new_tokens.iter().map(String::as_str).collect();
        let rescore = old.created_at != doc.created_at;
        let score = doc.created_at.as_nanos();
        let namesakes = self.namesakes(ctx, &doc.key())?;

        let mut batch = self.postings.batch();
        let mut removed = 0;
        for token in old_tokens.iter().filter(|t| !new_set.contains(t.as_str())) {
            namesakes.release(&mut batch, token, &doc.entity_id);
            removed += 1;
        }
        let mut added = 0;
        for token in &new_tokens {
            if !old_set.contains(token.as_str()) {
                batch.add_posting(token, &doc.entity_id, namesakes.score(token, score));
                self.autocomplete.queue_token(&mut batch, token);
                added += 1;
            } else if rescore {
                batch.add_posting(token, &doc.entity_id, namesakes.score(token, score));
            }
        }

        if batch.is_empty() {
            ctx.check()?;
            self.docs.put(doc)?;
            return Ok(IndexOutcome::Unchanged);
        }

        self.postings.commit(ctx, batch)?;
        ctx.check()?;
        let key = doc.key();
        self.docs.put(doc)?;

        debug!(
            target: "agora::index",
            entity_type = %key.entity_type,
            entity_id = %key.entity_id,
            added,
            removed,
            rescored = rescore,
            "entity re-indexed"
        );
        Ok(IndexOutcome::Updated { added, removed })
    }

    /// Remove an entity from the index. Unknown entities are a no-op.
    ///
    /// Postings are removed before the stored document, which is the only
    /// record of which postings exist. A posting another entity type still
    /// needs under the same id is kept and re-scored for that entity.
    pub fn delete_entity(&self, ctx: &OpContext, key: &DocKey) -> Result<IndexOutcome> {
        ctx.check()?;
        let old = match self.docs.get(key)? {
            Some(old) => old,
            None => {
                debug!(
                    target: "agora::index",
                    entity_type = %key.entity_type,
                    entity_id = %key.entity_id,
                    "delete of unindexed entity"
                );
                return Ok(IndexOutcome::Skipped);
            }
        };

        let tokens = tokenize(&old.indexed_text());
        let namesakes = self.namesakes(ctx, key)?;
        let mut batch = PostingBatch::new();
        for token in &tokens {
            namesakes.release(&mut batch, token, &key.entity_id);
        }
        self.postings.commit(ctx, batch)?;

        ctx.check()?;
        self.docs.delete(key)?;

        debug!(
            target: "agora::index",
            entity_type = %key.entity_type,
            entity_id = %key.entity_id,
            tokens = tokens.len(),
            "entity removed from index"
        );
        Ok(IndexOutcome::Deleted {
            tokens: tokens.len(),
        })
    }

    /// Apply one change event.
    ///
    /// POST indexes, PUT and PATCH update, DELETE removes. For the first
    /// three the domain record is fetched and normalized; a record that no
    /// longer exists is logged and skipped.
    pub fn index_data_change(&self, ctx: &OpContext, event: &ChangeEvent) -> Result<IndexOutcome> {
        let key = DocKey::new(event.entity_type, event.entity_id.clone());
        if event.method == Method::Delete {
            return self.delete_entity(ctx, &key);
        }

        let doc = match self.fetch_doc(ctx, &key) {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                warn!(
                    target: "agora::index",
                    entity_type = %key.entity_type,
                    entity_id = %key.entity_id,
                    method = event.method.as_str(),
                    "domain record not found, skipping"
                );
                return Ok(IndexOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let outcome = if event.method.is_update() {
            self.update_entity_indexes(ctx, doc)?
        } else {
            self.index_entity(ctx, doc)?
        };
        info!(
            target: "agora::index",
            event = %event,
            outcome = ?outcome,
            "change applied"
        );
        Ok(outcome)
    }

    /// Validate and apply an untyped change event.
    ///
    /// Fails with `UnsupportedEntity`, `UnsupportedMethod` or
    /// `InvalidEvent` before touching any store.
    pub fn index_raw_change(&self, ctx: &OpContext, raw: RawChangeEvent) -> Result<IndexOutcome> {
        let event = ChangeEvent::try_from(raw)?;
        self.index_data_change(ctx, &event)
    }

    fn fetch_doc(&self, ctx: &OpContext, key: &DocKey) -> Result<SearchDoc> {
        ctx.check()?;
        let record = self
            .domain
            .get(key.entity_type, &key.entity_id)?
            .ok_or_else(|| Error::not_found(key.entity_type.id(), key.entity_id.clone()))?;
        Ok(normalize(key.entity_type, &key.entity_id, &record))
    }

    /// Stored documents of other entity types that share `key`'s id.
    ///
    /// Posting members are bare ids, so these documents own the same
    /// postings as `key`'s document.
    fn namesakes(&self, ctx: &OpContext, key: &DocKey) -> Result<Namesakes> {
        let mut scores: FxHashMap<String, i64> = FxHashMap::default();
        for entity_type in EntityType::ALL {
            if entity_type == key.entity_type {
                continue;
            }
            ctx.check()?;
            let other = DocKey::new(entity_type, key.entity_id.clone());
            if let Some(doc) = self.docs.get(&other)? {
                let score = doc.created_at.as_nanos();
                for token in tokenize(&doc.indexed_text()) {
                    let best = scores.entry(token).or_insert(score);
                    *best = (*best).max(score);
                }
            }
        }
        Ok(Namesakes { scores })
    }
}

/// Tokens that same-id documents of other types still post, with the
/// newest `created_at` among them.
struct Namesakes {
    scores: FxHashMap<String, i64>,
}

impl Namesakes {
    /// Posting score for `token`: the newest of `own` and any namesake's.
    fn score(&self, token: &str, own: i64) -> i64 {
        self.scores.get(token).map_or(own, |&other| other.max(own))
    }

    /// Drop this document's claim on `token`. The posting stays, scored
    /// for the namesakes, while any of them still produces the token.
    fn release(&self, batch: &mut PostingBatch, token: &str, entity_id: &str) {
        match self.scores.get(token) {
            Some(&score) => batch.add_posting(token, entity_id, score),
            None => batch.remove_posting(token, entity_id),
        }
    }
}
