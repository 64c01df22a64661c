//! Fault-injecting store wrappers

use crate::documents::DocumentStore;
use crate::kv::{Pipeline, PipelineReport, SortedSetKv, ZCommand};
use crate::sorted_set::ScoredMember;
use agora_core::{DocKey, Error, Result, SearchDoc};
use parking_lot::Mutex;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Sorted-set store wrapper that fails on demand
pub struct FaultyKv<K> {
    inner: Arc<K>,
    fail_all: AtomicBool,
    partial_exec: Mutex<Option<usize>>,
    injected: AtomicU64,
}

impl<K: SortedSetKv> FaultyKv<K> {
    /// Wrap a store; no faults armed
    pub fn new(inner: Arc<K>) -> Self {
        FaultyKv {
            inner,
            fail_all: AtomicBool::new(false),
            partial_exec: Mutex::new(None),
            injected: AtomicU64::new(0),
        }
    }

    /// Make every call fail (or stop failing)
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// The next `exec` applies only its first `n` commands, then fails.
    ///
    /// One-shot: later pipelines run normally.
    pub fn fail_next_exec_after(&self, n: usize) {
        *self.partial_exec.lock() = Some(n);
    }

    /// How many failures were injected
    pub fn injected_failures(&self) -> u64 {
        self.injected.load(Ordering::SeqCst)
    }

    /// The wrapped store
    pub fn inner(&self) -> &Arc<K> {
        &self.inner
    }

    fn gate(&self) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            self.injected.fetch_add(1, Ordering::SeqCst);
            return Err(Error::store("injected kv failure"));
        }
        Ok(())
    }
}

impl<K: SortedSetKv> SortedSetKv for FaultyKv<K> {
    fn zadd(&self, key: &str, member: &str, score: i64) -> Result<bool> {
        self.gate()?;
        self.inner.zadd(key, member, score)
    }

    fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.gate()?;
        self.inner.zrem(key, member)
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>> {
        self.gate()?;
        self.inner.zscore(key, member)
    }

    fn zrevrange(&self, key: &str, limit: usize) -> Result<Vec<ScoredMember>> {
        self.gate()?;
        self.inner.zrevrange(key, limit)
    }

    fn zrangebylex(
        &self,
        key: &str,
        min: Bound<&str>,
        max: Bound<&str>,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.gate()?;
        self.inner.zrangebylex(key, min, max, limit)
    }

    fn zcard(&self, key: &str) -> Result<usize> {
        self.gate()?;
        self.inner.zcard(key)
    }

    fn del(&self, key: &str) -> Result<bool> {
        self.gate()?;
        self.inner.del(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.gate()?;
        self.inner.keys_with_prefix(prefix)
    }

    fn exec(&self, pipeline: Pipeline) -> Result<PipelineReport> {
        self.gate()?;
        let Some(n) = self.partial_exec.lock().take() else {
            return self.inner.exec(pipeline);
        };
        let mut partial = Pipeline::new();
        for command in pipeline.into_commands().into_iter().take(n) {
            match command {
                ZCommand::Add { key, member, score } => partial.zadd(key, member, score),
                ZCommand::Remove { key, member } => partial.zrem(key, member),
            }
        }
        self.inner.exec(partial)?;
        self.injected.fetch_add(1, Ordering::SeqCst);
        Err(Error::store(format!(
            "injected pipeline failure after {} commands",
            n
        )))
    }
}

/// Document store wrapper that fails on demand
pub struct FaultyDocumentStore<D> {
    inner: Arc<D>,
    fail_reads: AtomicBool,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl<D: DocumentStore> FaultyDocumentStore<D> {
    /// Wrap a store; no faults armed
    pub fn new(inner: Arc<D>) -> Self {
        FaultyDocumentStore {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Fail `get`, `scan` and `len`
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail `put`
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Fail `delete`
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store
    pub fn inner(&self) -> &Arc<D> {
        &self.inner
    }
}

fn injected(flag: &AtomicBool, what: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(Error::store(format!("injected document store {} failure", what)));
    }
    Ok(())
}

impl<D: DocumentStore> DocumentStore for FaultyDocumentStore<D> {
    fn get(&self, key: &DocKey) -> Result<Option<SearchDoc>> {
        injected(&self.fail_reads, "read")?;
        self.inner.get(key)
    }

    fn put(&self, doc: SearchDoc) -> Result<()> {
        injected(&self.fail_puts, "put")?;
        self.inner.put(doc)
    }

    fn delete(&self, key: &DocKey) -> Result<bool> {
        injected(&self.fail_deletes, "delete")?;
        self.inner.delete(key)
    }

    fn scan(&self) -> Result<Vec<SearchDoc>> {
        injected(&self.fail_reads, "read")?;
        self.inner.scan()
    }

    fn len(&self) -> Result<usize> {
        injected(&self.fail_reads, "read")?;
        self.inner.len()
    }
}
