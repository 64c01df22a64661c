//! Sorted-set KV store
//!
//! The posting lists and the autocomplete set live in a KV store whose
//! values are sorted sets. [`SortedSetKv`] is the seam: production
//! deployments put a networked store behind it, tests and embedded use get
//! [`MemoryKv`].
//!
//! # Consistency model
//!
//! - Each single-key mutation is atomic.
//! - A [`Pipeline`] is submitted as one round-trip and applied in order,
//!   but NOT atomically across keys: a failure part-way leaves the earlier
//!   commands applied.
//! - A key whose set becomes empty disappears.

use crate::sorted_set::{ScoredMember, SortedSet};
use agora_core::Result;
use dashmap::DashMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// One queued sorted-set mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZCommand {
    /// Add `member` to `key` with `score`, re-scoring if present
    Add {
        /// Sorted-set key
        key: String,
        /// Member to insert
        member: String,
        /// Score to assign
        score: i64,
    },
    /// Remove `member` from `key`; absent members are a no-op
    Remove {
        /// Sorted-set key
        key: String,
        /// Member to remove
        member: String,
    },
}

impl ZCommand {
    /// Key this command touches
    pub fn key(&self) -> &str {
        match self {
            ZCommand::Add { key, .. } | ZCommand::Remove { key, .. } => key,
        }
    }
}

/// Ordered batch of mutations submitted as one round-trip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<ZCommand>,
}

impl Pipeline {
    /// Empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `ZADD`
    pub fn zadd(&mut self, key: impl Into<String>, member: impl Into<String>, score: i64) {
        self.commands.push(ZCommand::Add {
            key: key.into(),
            member: member.into(),
            score,
        });
    }

    /// Queue a `ZREM`
    pub fn zrem(&mut self, key: impl Into<String>, member: impl Into<String>) {
        self.commands.push(ZCommand::Remove {
            key: key.into(),
            member: member.into(),
        });
    }

    /// Queued commands, in submission order
    pub fn commands(&self) -> &[ZCommand] {
        &self.commands
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Consume into the command list
    pub fn into_commands(self) -> Vec<ZCommand> {
        self.commands
    }
}

/// Outcome of an executed pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Commands applied
    pub applied: usize,
    /// Members that were newly inserted
    pub inserted: usize,
    /// Members that were actually removed
    pub removed: usize,
}

/// A KV store whose values are sorted sets.
///
/// Every method is one round-trip to the store.
pub trait SortedSetKv: Send + Sync {
    /// Add or re-score one member. Returns `true` if newly inserted.
    fn zadd(&self, key: &str, member: &str, score: i64) -> Result<bool>;

    /// Remove one member. Returns `true` if it was present.
    fn zrem(&self, key: &str, member: &str) -> Result<bool>;

    /// Score of a member, if present
    fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>>;

    /// Members by score descending, ties by member ascending; `limit == 0`
    /// means all.
    fn zrevrange(&self, key: &str, limit: usize) -> Result<Vec<ScoredMember>>;

    /// Members between two lexicographic bounds, ascending; `limit == 0`
    /// means all.
    fn zrangebylex(
        &self,
        key: &str,
        min: Bound<&str>,
        max: Bound<&str>,
        limit: usize,
    ) -> Result<Vec<String>>;

    /// Number of members under `key`
    fn zcard(&self, key: &str) -> Result<usize>;

    /// Drop a whole key. Returns `true` if it existed.
    fn del(&self, key: &str) -> Result<bool>;

    /// All keys starting with `prefix`, sorted
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Apply a pipeline in order as a single round-trip.
    fn exec(&self, pipeline: Pipeline) -> Result<PipelineReport>;
}

/// Sharded in-memory sorted-set store
///
/// DashMap shards the keyspace, so commands on different keys rarely
/// contend and each key is mutated under its shard lock.
#[derive(Debug, Default)]
pub struct MemoryKv {
    sets: DashMap<String, SortedSet>,
    round_trips: AtomicU64,
}

impl MemoryKv {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of round-trips served so far
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.sets.len()
    }

    fn trip(&self) {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
    }

    fn add_one(&self, key: &str, member: &str, score: i64) -> bool {
        self.sets
            .entry(key.to_string())
            .or_default()
            .add(member, score)
    }

    fn remove_one(&self, key: &str, member: &str) -> bool {
        let (removed, now_empty) = match self.sets.get_mut(key) {
            Some(mut set) => {
                let removed = set.remove(member);
                (removed, set.is_empty())
            }
            None => (false, false),
        };
        if now_empty {
            self.sets.remove_if(key, |_, set| set.is_empty());
        }
        removed
    }
}

impl SortedSetKv for MemoryKv {
    fn zadd(&self, key: &str, member: &str, score: i64) -> Result<bool> {
        self.trip();
        Ok(self.add_one(key, member, score))
    }

    fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.trip();
        Ok(self.remove_one(key, member))
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>> {
        self.trip();
        Ok(self.sets.get(key).and_then(|set| set.score(member)))
    }

    fn zrevrange(&self, key: &str, limit: usize) -> Result<Vec<ScoredMember>> {
        self.trip();
        Ok(self
            .sets
            .get(key)
            .map(|set| set.rev_range(limit))
            .unwrap_or_default())
    }

    fn zrangebylex(
        &self,
        key: &str,
        min: Bound<&str>,
        max: Bound<&str>,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.trip();
        Ok(self
            .sets
            .get(key)
            .map(|set| set.range_by_lex(min, max, limit))
            .unwrap_or_default())
    }

    fn zcard(&self, key: &str) -> Result<usize> {
        self.trip();
        Ok(self.sets.get(key).map(|set| set.len()).unwrap_or(0))
    }

    fn del(&self, key: &str) -> Result<bool> {
        self.trip();
        Ok(self.sets.remove(key).is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.trip();
        let mut keys: Vec<String> = self
            .sets
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn exec(&self, pipeline: Pipeline) -> Result<PipelineReport> {
        self.trip();
        let mut report = PipelineReport::default();
        for command in pipeline.into_commands() {
            match command {
                ZCommand::Add { key, member, score } => {
                    if self.add_one(&key, &member, score) {
                        report.inserted += 1;
                    }
                }
                ZCommand::Remove { key, member } => {
                    if self.remove_one(&key, &member) {
                        report.removed += 1;
                    }
                }
            }
            report.applied += 1;
        }
        trace!(
            target: "agora::kv",
            applied = report.applied,
            inserted = report.inserted,
            removed = report.removed,
            "pipeline executed"
        );
        Ok(report)
    }
}
