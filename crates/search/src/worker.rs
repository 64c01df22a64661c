//! Change-event worker pool.
//!
//! A fixed set of worker threads drains a bounded FIFO queue of
//! [`ChangeEvent`]s, calling [`Indexer::index_data_change`] for each one.
//! Retryable failures are replayed up to `max_retries` times with linear
//! backoff. That is safe because every indexing operation converges under
//! replay. Other failures are logged and the event is dropped.
//!
//! The pool does not serialize events per entity. Two events for the same
//! id submitted back to back may be applied by different workers in either
//! order; sources that need per-entity ordering should wait for
//! [`IndexWorkerPool::drain`] or shard events across single-worker pools.

use crate::indexer::Indexer;
use agora_core::{ChangeEvent, Error, OpContext, Result};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Sizing and retry policy for an [`IndexWorkerPool`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Worker threads (minimum 1)
    pub workers: usize,
    /// Events that may wait in the queue before `submit` pushes back
    pub queue_depth: usize,
    /// Replays after the first attempt for retryable failures
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_backoff`
    pub retry_backoff: Duration,
    /// Per-attempt deadline
    pub op_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions {
            workers: 4,
            queue_depth: 4096,
            max_retries: 3,
            retry_backoff: Duration::from_millis(50),
            op_timeout: Some(Duration::from_millis(5000)),
        }
    }
}

/// Pool metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Events waiting in the queue
    pub queue_depth: usize,
    /// Events being applied right now
    pub active: usize,
    /// Events applied successfully
    pub completed: u64,
    /// Events dropped after a non-retryable error or exhausted retries
    pub failed: u64,
    /// Replays performed
    pub retries: u64,
    /// Worker threads
    pub worker_count: usize,
}

struct PoolInner {
    indexer: Indexer,
    options: PoolOptions,
    queue: Mutex<VecDeque<ChangeEvent>>,
    work_ready: Condvar,
    drain_cond: Condvar,
    shutdown: AtomicBool,
    active: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
}

/// Fixed pool of indexing threads fed by a bounded queue
pub struct IndexWorkerPool {
    inner: Arc<PoolInner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl IndexWorkerPool {
    /// Spawn the workers.
    ///
    /// Workers are named `agora-index-0`, `agora-index-1`, etc.
    pub fn start(indexer: Indexer, options: PoolOptions) -> Result<Self> {
        let worker_count = options.workers.max(1);
        let inner = Arc::new(PoolInner {
            indexer,
            options,
            queue: Mutex::new(VecDeque::new()),
            work_ready: Condvar::new(),
            drain_cond: Condvar::new(),
            shutdown: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        });

        let pool = IndexWorkerPool {
            inner: Arc::clone(&inner),
            workers: Mutex::new(Vec::with_capacity(worker_count)),
            worker_count,
        };
        for i in 0..worker_count {
            let inner = Arc::clone(&inner);
            let handle = std::thread::Builder::new()
                .name(format!("agora-index-{}", i))
                .spawn(move || worker_loop(&inner));
            match handle {
                Ok(handle) => pool.workers.lock().push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(Error::store(format!("failed to spawn index worker: {}", e)));
                }
            }
        }
        debug!(target: "agora::worker", workers = worker_count, "index worker pool started");
        Ok(pool)
    }

    /// Queue an event.
    ///
    /// Fails with `Backpressure` when the queue is full or the pool has
    /// been shut down.
    pub fn submit(&self, event: ChangeEvent) -> Result<()> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(Error::Backpressure("index worker pool is shut down".to_string()));
        }
        {
            let mut queue = self.inner.queue.lock();
            if queue.len() >= self.inner.options.queue_depth {
                return Err(Error::Backpressure(format!(
                    "index queue is full ({} events)",
                    queue.len()
                )));
            }
            queue.push_back(event);
        }
        self.inner.work_ready.notify_one();
        Ok(())
    }

    /// Block until every queued and in-flight event has been handled.
    ///
    /// Workers keep running afterwards.
    pub fn drain(&self) {
        let mut queue = self.inner.queue.lock();
        while !queue.is_empty() || self.inner.active.load(Ordering::Acquire) > 0 {
            self.inner.drain_cond.wait(&mut queue);
        }
    }

    /// Stop accepting events, finish the queue, and join the workers.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        {
            let _queue = self.inner.queue.lock();
            self.inner.work_ready.notify_all();
        }
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// Metrics snapshot
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            queue_depth: self.inner.queue.lock().len(),
            active: self.inner.active.load(Ordering::Relaxed),
            completed: self.inner.completed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            retries: self.inner.retries.load(Ordering::Relaxed),
            worker_count: self.worker_count,
        }
    }
}

impl Drop for IndexWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Decrements `active` and wakes drain waiters, even if handling panicked.
struct ActiveGuard<'a> {
    inner: &'a PoolInner,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let prev = self.inner.active.fetch_sub(1, Ordering::Release);
        if prev == 1 {
            let queue = self.inner.queue.lock();
            if queue.is_empty() {
                self.inner.drain_cond.notify_all();
            }
        }
    }
}

fn worker_loop(inner: &PoolInner) {
    loop {
        let event = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(event) = queue.pop_front() {
                    inner.active.fetch_add(1, Ordering::Release);
                    break event;
                }
                if inner.shutdown.load(Ordering::Acquire) {
                    return;
                }
                inner.work_ready.wait(&mut queue);
            }
        };

        let _guard = ActiveGuard { inner };
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            apply_with_retry(inner, &event)
        }));
        match outcome {
            Ok(Ok(())) => {
                inner.completed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: "agora::worker",
                    event = %event,
                    error = %e,
                    "change event dropped"
                );
            }
            Err(panic) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    target: "agora::worker",
                    event = %event,
                    "indexing panicked: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic)")
}

/// Wait before replay `attempt`: `unit * attempt`, or `unit` on overflow.
fn backoff(unit: Duration, attempt: u32) -> Duration {
    unit.checked_mul(attempt).unwrap_or(unit)
}

fn apply_with_retry(inner: &PoolInner, event: &ChangeEvent) -> Result<()> {
    let mut attempt: u32 = 0;
    loop {
        let ctx = match inner.options.op_timeout {
            Some(timeout) => OpContext::with_timeout(timeout),
            None => OpContext::background(),
        };
        match inner.indexer.index_data_change(&ctx, event) {
            Ok(_) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < inner.options.max_retries => {
                attempt += 1;
                inner.retries.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "agora::worker",
                    event = %event,
                    attempt,
                    error = %e,
                    "retrying change event"
                );
                std::thread::sleep(backoff(inner.options.retry_backoff, attempt));
            }
            Err(e) => return Err(e),
        }
    }
}
