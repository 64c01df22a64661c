//! Posting-list reconciliation
//!
//! Repairs drift between the stored search documents and the posting
//! lists, such as postings left behind by two racing updates of one entity.
//! Built only from the stores' public operations:
//!
//! 1. **Re-post**: every stored document's tokens are posted again with its
//!    current `created_at` (the newest one when documents of several types
//!    share an id). Idempotent; fixes missing postings and stale scores,
//!    and re-adds autocomplete tokens.
//! 2. **Sweep**: every `inverted:` and `hashtag:` key is scanned; members
//!    whose stored documents no longer produce that token are removed.
//!
//! The sweep trusts the documents it read in step 1. Updates write postings
//! before their document, so a run that overlaps live indexing may sweep a
//! posting that the in-flight update is about to justify. Run it while the
//! event source is paused, or run it twice.

use crate::autocomplete::AutocompleteStore;
use crate::postings::{token_of_key, PostingStore, HASHTAG_PREFIX};
use crate::tokenizer::tokenize;
use agora_core::{OpContext, Result};
use agora_storage::DocumentStore;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// What a reconciliation pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Stored documents visited
    pub docs_scanned: usize,
    /// Postings that were missing and got re-added
    pub postings_added: usize,
    /// Orphan postings removed
    pub postings_removed: usize,
    /// Autocomplete tokens that were missing and got re-added
    pub tokens_added: usize,
}

/// Rebuilds posting lists from the stored documents
pub struct Reconciler {
    postings: PostingStore,
    autocomplete: AutocompleteStore,
    docs: Arc<dyn DocumentStore>,
}

impl Reconciler {
    /// Create a reconciler over the given stores
    pub fn new(
        postings: PostingStore,
        autocomplete: AutocompleteStore,
        docs: Arc<dyn DocumentStore>,
    ) -> Self {
        Reconciler {
            postings,
            autocomplete,
            docs,
        }
    }

    /// Run one full pass. Safe to interrupt and re-run.
    pub fn run(&self, ctx: &OpContext) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        ctx.check()?;
        let docs = self.docs.scan()?;

        // Same-id documents of different types share postings; each posting
        // scores with the newest of them.
        let mut expected: FxHashMap<String, FxHashMap<String, i64>> = FxHashMap::default();
        for doc in &docs {
            let score = doc.created_at.as_nanos();
            let tokens = expected.entry(doc.entity_id.clone()).or_default();
            for token in tokenize(&doc.indexed_text()) {
                let best = tokens.entry(token).or_insert(score);
                *best = (*best).max(score);
            }
        }

        for doc in &docs {
            report.docs_scanned += 1;
            let own = doc.created_at.as_nanos();
            let scores = expected.get(&doc.entity_id);

            let mut postings = self.postings.batch();
            let mut suggestions = self.postings.batch();
            for token in tokenize(&doc.indexed_text()) {
                let score = scores
                    .and_then(|scores| scores.get(&token))
                    .map_or(own, |&best| best.max(own));
                postings.add_posting(&token, &doc.entity_id, score);
                self.autocomplete.queue_token(&mut suggestions, &token);
            }
            report.postings_added += self.postings.commit(ctx, postings)?.inserted;
            report.tokens_added += self.postings.commit(ctx, suggestions)?.inserted;
        }

        for key in self.postings.posting_keys(ctx)? {
            let token = match token_of_key(&key) {
                Some(token) => token,
                None => continue,
            };
            for posting in self.postings.postings_at(ctx, &key)? {
                let justified = expected
                    .get(&posting.member)
                    .is_some_and(|tokens| tokens.contains_key(token));
                if !justified && self.postings.remove_now(ctx, &key, &posting.member)? {
                    report.postings_removed += 1;
                    debug!(
                        target: "agora::reconcile",
                        key = %key,
                        entity_id = %posting.member,
                        hashtag_view = key.starts_with(HASHTAG_PREFIX),
                        "orphan posting removed"
                    );
                }
            }
        }

        info!(
            target: "agora::reconcile",
            docs_scanned = report.docs_scanned,
            postings_added = report.postings_added,
            postings_removed = report.postings_removed,
            tokens_added = report.tokens_added,
            "reconciliation pass complete"
        );
        Ok(report)
    }
}
