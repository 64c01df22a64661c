//! Testing utilities for failure semantics
//!
//! The indexer is at-least-once: a store failure mid-operation is returned
//! to the caller, which retries the same event. These wrappers inject such
//! failures so tests can verify that replays converge.
//!
//! - **FaultyKv**: fail every call, or apply only the first `n` commands of
//!   the next pipeline and then fail (a partial, non-atomic commit)
//! - **FaultyDocumentStore**: fail reads, writes or deletes on demand
//!
//! # Example
//!
//! ```
//! use agora_storage::testing::FaultyKv;
//! use agora_storage::{MemoryKv, Pipeline, SortedSetKv};
//! use std::sync::Arc;
//!
//! let kv = FaultyKv::new(Arc::new(MemoryKv::new()));
//! kv.fail_next_exec_after(1);
//!
//! let mut p = Pipeline::new();
//! p.zadd("a", "m", 1);
//! p.zadd("b", "m", 1);
//! assert!(kv.exec(p).is_err());
//! assert_eq!(kv.zcard("a").unwrap(), 1);
//! assert_eq!(kv.zcard("b").unwrap(), 0);
//! ```

mod faulty;

pub use faulty::{FaultyDocumentStore, FaultyKv};
