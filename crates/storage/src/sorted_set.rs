//! In-memory sorted set
//!
//! The value type behind every key of [`MemoryKv`](crate::MemoryKv).
//! Semantics follow the usual sorted-set KV model:
//!
//! - members are unique; re-adding a member updates its score
//! - score order is descending with ties broken by member ascending
//! - lexicographic range queries order by member only and are meaningful
//!   when every member carries the same score
//!
//! # Design
//!
//! Two indexes over the same members:
//! - `by_member`: member -> score, ordered by member (lex ranges, lookups)
//! - `by_score`: (Reverse(score), member), ordered for recency scans

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// A member and its score
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoredMember {
    /// Member text (an entity id or a token)
    pub member: String,
    /// Integer score
    pub score: i64,
}

impl ScoredMember {
    /// Create a scored member
    pub fn new(member: impl Into<String>, score: i64) -> Self {
        ScoredMember {
            member: member.into(),
            score,
        }
    }
}

/// Sorted set of unique string members with integer scores
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    by_member: BTreeMap<String, i64>,
    by_score: BTreeSet<(Reverse<i64>, String)>,
}

impl SortedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or re-score a member.
    ///
    /// Returns `true` if the member was not present before.
    pub fn add(&mut self, member: &str, score: i64) -> bool {
        match self.by_member.get_mut(member) {
            Some(existing) => {
                if *existing != score {
                    self.by_score.remove(&(Reverse(*existing), member.to_string()));
                    self.by_score.insert((Reverse(score), member.to_string()));
                    *existing = score;
                }
                false
            }
            None => {
                self.by_member.insert(member.to_string(), score);
                self.by_score.insert((Reverse(score), member.to_string()));
                true
            }
        }
    }

    /// Remove a member. Returns `true` if it was present.
    pub fn remove(&mut self, member: &str) -> bool {
        match self.by_member.remove(member) {
            Some(score) => {
                self.by_score.remove(&(Reverse(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    /// Score of a member
    pub fn score(&self, member: &str) -> Option<i64> {
        self.by_member.get(member).copied()
    }

    /// Whether a member is present
    pub fn contains(&self, member: &str) -> bool {
        self.by_member.contains_key(member)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.by_member.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.by_member.is_empty()
    }

    /// Members by score descending, ties by member ascending.
    ///
    /// `limit == 0` returns everything.
    pub fn rev_range(&self, limit: usize) -> Vec<ScoredMember> {
        let take = if limit == 0 { usize::MAX } else { limit };
        self.by_score
            .iter()
            .take(take)
            .map(|(Reverse(score), member)| ScoredMember::new(member.clone(), *score))
            .collect()
    }

    /// Members whose text falls between `min` and `max`, ascending.
    ///
    /// `limit == 0` returns everything in range. An empty or inverted
    /// range yields nothing.
    pub fn range_by_lex(&self, min: Bound<&str>, max: Bound<&str>, limit: usize) -> Vec<String> {
        if is_empty_range(min, max) {
            return Vec::new();
        }
        let take = if limit == 0 { usize::MAX } else { limit };
        self.by_member
            .range::<str, _>((min, max))
            .take(take)
            .map(|(member, _)| member.clone())
            .collect()
    }
}

fn is_empty_range(min: Bound<&str>, max: Bound<&str>) -> bool {
    match (min, max) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        _ => false,
    }
}
