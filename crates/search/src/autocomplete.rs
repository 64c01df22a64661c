//! Autocomplete Store
//!
//! One sorted set, `autocomplete:tokens`, holding every token ever indexed
//! with a uniform score of 0, so members order lexicographically. A prefix
//! query is the lexicographic range `[q, q + "\u{ff}"]`.
//!
//! Tokens are never removed, even after their last posting is gone.
//! Suggestions are advisory and a vanished token may come back with the
//! next entity that uses it.

use crate::postings::PostingBatch;
use agora_core::{OpContext, Result};
use agora_storage::SortedSetKv;
use std::ops::Bound;
use std::sync::Arc;

/// Key of the token set
pub const AUTOCOMPLETE_KEY: &str = "autocomplete:tokens";

/// Upper-bound sentinel appended to a prefix for range scans
const PREFIX_END: char = '\u{ff}';

/// Prefix suggestions over all indexed tokens
#[derive(Clone)]
pub struct AutocompleteStore {
    kv: Arc<dyn SortedSetKv>,
}

impl AutocompleteStore {
    /// Wrap a KV handle
    pub fn new(kv: Arc<dyn SortedSetKv>) -> Self {
        AutocompleteStore { kv }
    }

    /// Add a token right away. Idempotent.
    pub fn add_token(&self, ctx: &OpContext, token: &str) -> Result<()> {
        ctx.check()?;
        self.kv.zadd(AUTOCOMPLETE_KEY, token, 0)?;
        Ok(())
    }

    /// Queue a token on a posting batch so it rides the same round-trip.
    pub fn queue_token(&self, batch: &mut PostingBatch, token: &str) {
        batch.add_raw(AUTOCOMPLETE_KEY, token, 0);
    }

    /// Tokens starting with `prefix`, ascending; `limit == 0` means all.
    ///
    /// The prefix is lowercased to match token normalization. An empty
    /// prefix lists tokens from the start of the set.
    pub fn prefix(&self, ctx: &OpContext, prefix: &str, limit: usize) -> Result<Vec<String>> {
        ctx.check()?;
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return self
                .kv
                .zrangebylex(AUTOCOMPLETE_KEY, Bound::Unbounded, Bound::Unbounded, limit);
        }
        let mut upper = prefix.clone();
        upper.push(PREFIX_END);
        self.kv.zrangebylex(
            AUTOCOMPLETE_KEY,
            Bound::Included(prefix.as_str()),
            Bound::Included(upper.as_str()),
            limit,
        )
    }

    /// Number of distinct tokens ever indexed
    pub fn token_count(&self, ctx: &OpContext) -> Result<usize> {
        ctx.check()?;
        self.kv.zcard(AUTOCOMPLETE_KEY)
    }
}
