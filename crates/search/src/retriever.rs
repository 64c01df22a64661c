//! Id retrieval over the posting lists
//!
//! Two strategies, chosen by [`QueryPlan`]:
//!
//! - **AND**: fetch every token's list concurrently, walk the shortest one
//!   in recency order, keep ids present in all the others.
//! - **Boosted**: weighted union. Each query term adds [`PLAIN_WEIGHT`] to
//!   ids posted under the term as a word or as a hashtag; each hashtag in
//!   the query adds [`HASHTAG_WEIGHT`] to ids in its `hashtag:` list.
//!
//! Both weights are part of the ranking contract and are not configurable.

use crate::planner::QueryPlan;
use crate::postings::{hashtag_key, inverted_key, PostingStore};
use crate::tokenizer::{bare, is_hashtag, HASHTAG_PREFIX};
use agora_core::{OpContext, Result};
use agora_storage::ScoredMember;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// Points for a plain term hit
pub const PLAIN_WEIGHT: u32 = 3;

/// Points for a hashtag hit
pub const HASHTAG_WEIGHT: u32 = 7;

/// A ranked id from the boosted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredId {
    /// Entity id
    pub entity_id: String,
    /// Sum of term weights
    pub score: u32,
    /// Posting score under the first query term, if posted there
    pub recency: Option<i64>,
}

/// Runs query plans against the posting store
#[derive(Clone)]
pub struct Retriever {
    postings: PostingStore,
}

impl Retriever {
    /// Wrap a posting store
    pub fn new(postings: PostingStore) -> Self {
        Retriever { postings }
    }

    /// Ordered ids for a plan; `limit == 0` means all.
    pub fn retrieve(&self, ctx: &OpContext, plan: &QueryPlan, limit: usize) -> Result<Vec<String>> {
        match plan {
            QueryPlan::Empty => Ok(Vec::new()),
            QueryPlan::And { tokens } => self.and_search(ctx, tokens, limit),
            QueryPlan::Boosted { tokens } => Ok(self
                .boosted_search(ctx, tokens, limit)?
                .into_iter()
                .map(|s| s.entity_id)
                .collect()),
        }
    }

    /// Ids posted under every token, most recent first under the rarest
    /// token.
    pub fn and_search(&self, ctx: &OpContext, tokens: &[String], limit: usize) -> Result<Vec<String>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut lists: Vec<Vec<String>> = tokens
            .par_iter()
            .map(|token| self.postings.ids_for_token(ctx, token))
            .collect::<Result<_>>()?;

        if lists.iter().any(Vec::is_empty) {
            return Ok(Vec::new());
        }
        lists.sort_by_key(Vec::len);

        let (base, rest) = match lists.split_first() {
            Some(split) => split,
            None => return Ok(Vec::new()),
        };
        let members: Vec<FxHashSet<&str>> = rest
            .iter()
            .map(|list| list.iter().map(String::as_str).collect())
            .collect();

        let mut matched = Vec::new();
        for id in base {
            if members.iter().all(|set| set.contains(id.as_str())) {
                matched.push(id.clone());
                if limit > 0 && matched.len() >= limit {
                    break;
                }
            }
        }
        Ok(matched)
    }

    /// Weighted union ranking.
    ///
    /// Order: score descending, then recency under the first query term
    /// (ids not posted there come last), then id ascending.
    pub fn boosted_search(
        &self,
        ctx: &OpContext,
        tokens: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredId>> {
        let first = match tokens.first() {
            Some(first) => bare(first),
            None => return Ok(Vec::new()),
        };

        let mut terms: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut seen = FxHashSet::default();
        for token in tokens {
            let term = bare(token);
            if seen.insert(term) {
                terms.push(term);
            }
        }
        let tags: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| is_hashtag(t))
            .collect();

        let mut keys: Vec<String> = Vec::with_capacity(terms.len() * 2 + tags.len());
        for term in &terms {
            keys.push(inverted_key(term));
            keys.push(inverted_key(&format!("{}{}", HASHTAG_PREFIX, term)));
        }
        for tag in &tags {
            keys.push(hashtag_key(tag));
        }
        let fetched: Vec<Vec<ScoredMember>> = keys
            .par_iter()
            .map(|key| self.postings.postings_at(ctx, key))
            .collect::<Result<_>>()?;
        let lists: FxHashMap<&str, Vec<ScoredMember>> =
            keys.iter().map(String::as_str).zip(fetched).collect();

        let mut scores: FxHashMap<&str, u32> = FxHashMap::default();
        for term in &terms {
            let word = inverted_key(term);
            let tag = inverted_key(&format!("{}{}", HASHTAG_PREFIX, term));
            let mut hit: FxHashSet<&str> = FxHashSet::default();
            for key in [word.as_str(), tag.as_str()] {
                if let Some(list) = lists.get(key) {
                    hit.extend(list.iter().map(|p| p.member.as_str()));
                }
            }
            for id in hit {
                *scores.entry(id).or_default() += PLAIN_WEIGHT;
            }
        }
        for tag in &tags {
            if let Some(list) = lists.get(hashtag_key(tag).as_str()) {
                for posting in list {
                    *scores.entry(posting.member.as_str()).or_default() += HASHTAG_WEIGHT;
                }
            }
        }

        let mut recency: FxHashMap<&str, i64> = FxHashMap::default();
        let first_keys = [
            inverted_key(first),
            inverted_key(&format!("{}{}", HASHTAG_PREFIX, first)),
        ];
        for key in &first_keys {
            if let Some(list) = lists.get(key.as_str()) {
                for posting in list {
                    let entry = recency.entry(posting.member.as_str()).or_insert(posting.score);
                    *entry = (*entry).max(posting.score);
                }
            }
        }

        let mut ranked: Vec<ScoredId> = scores
            .into_iter()
            .map(|(id, score)| ScoredId {
                entity_id: id.to_string(),
                score,
                recency: recency.get(id).copied(),
            })
            .collect();
        ranked.sort_by(rank_order);
        if limit > 0 {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }
}

fn rank_order(a: &ScoredId, b: &ScoredId) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| match (a.recency, b.recency) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}
