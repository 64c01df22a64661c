//! Posting Store
//!
//! Posting lists are sorted sets in the KV store:
//!
//! - `inverted:<token>` for every token
//! - `hashtag:<token>` additionally for tokens starting with `#`
//!
//! Members are entity ids, scores are `created_at` in nanoseconds, so a
//! reverse range scan yields ids most-recent-first (ties by id ascending).
//!
//! Writes are queued on a [`PostingBatch`] and submitted with
//! [`PostingStore::commit`] as a single pipeline. Hashtag tokens are
//! mirrored into both keys on every add and remove, so the `inverted:` view
//! stays uniform for AND queries while the `hashtag:` view feeds boosted
//! scoring.

use crate::tokenizer::is_hashtag;
use agora_core::{OpContext, Result};
use agora_storage::{Pipeline, PipelineReport, ScoredMember, SortedSetKv};
use std::sync::Arc;
use tracing::debug;

/// Key prefix of the general posting lists
pub const INVERTED_PREFIX: &str = "inverted:";

/// Key prefix of the hashtag-only posting lists
pub const HASHTAG_PREFIX: &str = "hashtag:";

/// `inverted:<token>`
pub fn inverted_key(token: &str) -> String {
    format!("{}{}", INVERTED_PREFIX, token)
}

/// `hashtag:<token>`
pub fn hashtag_key(token: &str) -> String {
    format!("{}{}", HASHTAG_PREFIX, token)
}

/// Queued posting mutations for one indexing event
#[derive(Debug, Default)]
pub struct PostingBatch {
    pipeline: Pipeline,
}

impl PostingBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entity_id` into the posting list(s) of `token`.
    ///
    /// Idempotent; re-adding updates the score.
    pub fn add_posting(&mut self, token: &str, entity_id: &str, score: i64) {
        self.pipeline.zadd(inverted_key(token), entity_id, score);
        if is_hashtag(token) {
            self.pipeline.zadd(hashtag_key(token), entity_id, score);
        }
    }

    /// Queue removal of `entity_id` from the posting list(s) of `token`.
    ///
    /// Removing an absent posting is a no-op.
    pub fn remove_posting(&mut self, token: &str, entity_id: &str) {
        self.pipeline.zrem(inverted_key(token), entity_id);
        if is_hashtag(token) {
            self.pipeline.zrem(hashtag_key(token), entity_id);
        }
    }

    /// Queue a raw `ZADD` riding on the same round-trip
    pub(crate) fn add_raw(&mut self, key: &str, member: &str, score: i64) {
        self.pipeline.zadd(key, member, score);
    }

    /// Number of queued KV commands
    pub fn len(&self) -> usize {
        self.pipeline.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    pub(crate) fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }
}

/// Typed access to the posting lists
#[derive(Clone)]
pub struct PostingStore {
    kv: Arc<dyn SortedSetKv>,
}

impl PostingStore {
    /// Wrap a KV handle
    pub fn new(kv: Arc<dyn SortedSetKv>) -> Self {
        PostingStore { kv }
    }

    /// Open a batch
    pub fn batch(&self) -> PostingBatch {
        PostingBatch::new()
    }

    /// Submit a batch as one pipelined round-trip.
    ///
    /// Not atomic across keys: on error some postings may already be
    /// applied. Replaying the same batch converges.
    pub fn commit(&self, ctx: &OpContext, batch: PostingBatch) -> Result<PipelineReport> {
        if batch.is_empty() {
            return Ok(PipelineReport::default());
        }
        ctx.check()?;
        let commands = batch.len();
        let report = self.kv.exec(batch.into_pipeline())?;
        debug!(
            target: "agora::index",
            commands,
            inserted = report.inserted,
            removed = report.removed,
            "posting batch committed"
        );
        Ok(report)
    }

    /// Ids posted under `token`, most recent first
    pub fn ids_for_token(&self, ctx: &OpContext, token: &str) -> Result<Vec<String>> {
        Ok(self
            .postings(ctx, token)?
            .into_iter()
            .map(|p| p.member)
            .collect())
    }

    /// Postings under `inverted:<token>` with scores, most recent first
    pub fn postings(&self, ctx: &OpContext, token: &str) -> Result<Vec<ScoredMember>> {
        ctx.check()?;
        self.kv.zrevrange(&inverted_key(token), 0)
    }

    /// Postings under `hashtag:<token>` with scores, most recent first
    pub fn hashtag_postings(&self, ctx: &OpContext, token: &str) -> Result<Vec<ScoredMember>> {
        ctx.check()?;
        self.kv.zrevrange(&hashtag_key(token), 0)
    }

    /// Remove a posting directly, outside any batch
    pub fn remove_now(&self, ctx: &OpContext, key: &str, entity_id: &str) -> Result<bool> {
        ctx.check()?;
        self.kv.zrem(key, entity_id)
    }

    /// All posting-list keys (both views), sorted
    pub fn posting_keys(&self, ctx: &OpContext) -> Result<Vec<String>> {
        ctx.check()?;
        let mut keys = self.kv.keys_with_prefix(INVERTED_PREFIX)?;
        ctx.check()?;
        keys.extend(self.kv.keys_with_prefix(HASHTAG_PREFIX)?);
        Ok(keys)
    }

    /// Every posting under a raw key, most recent first
    pub fn postings_at(&self, ctx: &OpContext, key: &str) -> Result<Vec<ScoredMember>> {
        ctx.check()?;
        self.kv.zrevrange(key, 0)
    }
}

/// Token a posting key refers to, if it is a posting key
pub fn token_of_key(key: &str) -> Option<&str> {
    key.strip_prefix(INVERTED_PREFIX)
        .or_else(|| key.strip_prefix(HASHTAG_PREFIX))
}
