//! Replay convergence after injected store failures.
//!
//! Every indexing operation may fail part-way. Re-running the same
//! operation must reach the state a clean run would have produced.

use crate::common::*;
use agora_core::{CancelHandle, DocKey, EntityType, Error, OpContext, Result, SearchDoc};
use agora_search::{SearchConfig, SearchCore};
use agora_storage::{DocumentStore, MemoryDocumentStore, MemoryDomainStore, MemoryKv};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn posting_state(h: &Harness) -> BTreeMap<String, Vec<(String, i64)>> {
    h.kv_state()
        .into_iter()
        .filter(|(key, _)| !key.starts_with("autocomplete:"))
        .collect()
}

fn stored(h: &Harness, id: &str) -> Option<SearchDoc> {
    h.docs.get(&DocKey::new(EntityType::Events, id)).unwrap()
}

fn original() -> SearchDoc {
    doc(EntityType::Events, "e1", "Jazz #live night", "music downtown", 5)
}

fn revised() -> SearchDoc {
    doc(EntityType::Events, "e1", "Rock #live", "loud music", 5)
}

#[test]
fn partial_index_commit_converges_on_replay() {
    let clean = Harness::new();
    clean.index(original());

    let h = Harness::new();
    h.kv.fail_next_exec_after(2);
    let err = h.core.index_entity(&h.ctx(), original()).unwrap_err();
    assert!(err.is_retryable());
    assert_ne!(h.kv_state(), clean.kv_state());

    h.core.index_entity(&h.ctx(), original()).unwrap();
    assert_eq!(h.kv_state(), clean.kv_state());
}

#[test]
fn index_persists_document_before_postings() {
    let h = Harness::new();
    h.docs.set_fail_puts(true);
    assert!(h.core.index_entity(&h.ctx(), original()).is_err());
    assert!(h.kv_state().is_empty());

    h.docs.set_fail_puts(false);
    h.core.index_entity(&h.ctx(), original()).unwrap();
    assert_eq!(h.ids("jazz"), strs(&["e1"]));
}

#[test]
fn partial_update_keeps_old_document_and_converges() {
    let clean = Harness::new();
    clean.index(original());
    clean.update(revised());

    let h = Harness::new();
    h.index(original());
    h.kv.fail_next_exec_after(1);
    assert!(h.core.update_entity_indexes(&h.ctx(), revised()).is_err());
    assert_eq!(stored(&h, "e1").unwrap().title, "Jazz #live night");

    h.core.update_entity_indexes(&h.ctx(), revised()).unwrap();
    assert_eq!(posting_state(&h), posting_state(&clean));
    assert_eq!(stored(&h, "e1").unwrap().title, "Rock #live");
}

#[test]
fn update_document_write_failure_converges() {
    let clean = Harness::new();
    clean.index(original());
    clean.update(revised());

    let h = Harness::new();
    h.index(original());
    h.docs.set_fail_puts(true);
    assert!(h.core.update_entity_indexes(&h.ctx(), revised()).is_err());
    // Postings moved, document did not
    assert_eq!(posting_state(&h), posting_state(&clean));
    assert_eq!(stored(&h, "e1").unwrap().title, "Jazz #live night");

    h.docs.set_fail_puts(false);
    h.core.update_entity_indexes(&h.ctx(), revised()).unwrap();
    assert_eq!(posting_state(&h), posting_state(&clean));
    assert_eq!(stored(&h, "e1").unwrap().title, "Rock #live");
}

#[test]
fn partial_delete_keeps_document_and_converges() {
    let h = Harness::new();
    h.index(original());
    h.kv.fail_next_exec_after(2);
    let key = DocKey::new(EntityType::Events, "e1");
    assert!(h.core.delete_entity(&h.ctx(), EntityType::Events, "e1").is_err());
    assert!(h.docs.get(&key).unwrap().is_some());

    h.core
        .delete_entity(&h.ctx(), EntityType::Events, "e1")
        .unwrap();
    assert!(posting_state(&h).is_empty());
    assert!(h.docs.get(&key).unwrap().is_none());
}

#[test]
fn delete_document_failure_converges() {
    let h = Harness::new();
    h.index(original());
    h.docs.set_fail_deletes(true);
    assert!(h.core.delete_entity(&h.ctx(), EntityType::Events, "e1").is_err());
    assert!(posting_state(&h).is_empty());
    assert!(stored(&h, "e1").is_some());

    h.docs.set_fail_deletes(false);
    h.core
        .delete_entity(&h.ctx(), EntityType::Events, "e1")
        .unwrap();
    assert!(stored(&h, "e1").is_none());
}

#[test]
fn failed_update_then_new_update_reconciles() {
    let clean = Harness::new();
    clean.index(doc(EntityType::Events, "e1", "gamma delta", "", 1));

    let h = Harness::new();
    h.index(doc(EntityType::Events, "e1", "alpha beta", "", 1));
    h.kv.fail_next_exec_after(1);
    assert!(h
        .core
        .update_entity_indexes(&h.ctx(), doc(EntityType::Events, "e1", "beta gamma", "", 1))
        .is_err());
    h.update(doc(EntityType::Events, "e1", "gamma delta", "", 1));
    assert_eq!(posting_state(&h), posting_state(&clean));
}

#[test]
fn reconciler_repairs_what_delta_updates_cannot() {
    let h = Harness::new();
    h.index(doc(EntityType::Events, "e1", "alpha", "", 1));
    // Update to "alpha gamma": the gamma posting lands, the document write
    // fails. The source then gives up and later reverts to "alpha".
    h.docs.set_fail_puts(true);
    assert!(h
        .core
        .update_entity_indexes(&h.ctx(), doc(EntityType::Events, "e1", "alpha gamma", "", 1))
        .is_err());
    h.docs.set_fail_puts(false);
    h.update(doc(EntityType::Events, "e1", "alpha", "", 1));
    assert_eq!(h.ids("gamma"), strs(&["e1"]));

    let report = h.core.reconcile(&h.ctx()).unwrap();
    assert_eq!(report.postings_removed, 1);
    assert!(h.ids("gamma").is_empty());
    assert_eq!(h.ids("alpha"), strs(&["e1"]));
}

#[test]
fn store_outage_is_retryable_and_leaves_queries_empty() {
    let h = Harness::new();
    h.index(original());
    h.kv.set_fail_all(true);
    let brunch = doc(EntityType::Events, "e2", "Jazz brunch", "", 6);
    let err = h.core.index_entity(&h.ctx(), brunch.clone()).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, Error::Store(_)));
    assert!(h.core.search(EntityType::Events, "jazz", 10).is_empty());

    h.kv.set_fail_all(false);
    assert_eq!(h.ids("jazz"), strs(&["e1"]));
    h.core.index_entity(&h.ctx(), brunch).unwrap();
    assert_eq!(h.ids("jazz"), strs(&["e2", "e1"]));
}

#[test]
fn expired_deadline_issues_no_writes() {
    let h = Harness::new();
    let ctx = OpContext::with_timeout(Duration::ZERO);
    std::thread::sleep(Duration::from_millis(1));
    let err = h.core.index_entity(&ctx, original()).unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(h.kv_state().is_empty());
    assert!(stored(&h, "e1").is_none());
}

/// Document store that fires a cancellation handle while writing.
struct CancelOnPut {
    inner: MemoryDocumentStore,
    cancel: CancelHandle,
}

impl DocumentStore for CancelOnPut {
    fn get(&self, key: &DocKey) -> Result<Option<SearchDoc>> {
        self.inner.get(key)
    }

    fn put(&self, doc: SearchDoc) -> Result<()> {
        self.inner.put(doc)?;
        self.cancel.cancel();
        Ok(())
    }

    fn delete(&self, key: &DocKey) -> Result<bool> {
        self.inner.delete(key)
    }

    fn scan(&self) -> Result<Vec<SearchDoc>> {
        self.inner.scan()
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }
}

#[test]
fn cancellation_mid_index_acts_like_a_crash() {
    let cancel = CancelHandle::new();
    let docs = Arc::new(CancelOnPut {
        inner: MemoryDocumentStore::new(),
        cancel: cancel.clone(),
    });
    let kv = Arc::new(MemoryKv::new());
    let core = SearchCore::new(
        kv.clone(),
        docs.clone(),
        Arc::new(MemoryDomainStore::new()),
        SearchConfig::default(),
    )
    .unwrap();

    let ctx = OpContext::background().with_cancel(cancel);
    let err = core.index_entity(&ctx, original()).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    // The in-flight document write completed; no posting round-trip followed
    assert_eq!(docs.len().unwrap(), 1);
    assert_eq!(kv.key_count(), 0);

    core.index_entity(&OpContext::background(), original())
        .unwrap();
    assert_eq!(core.search_ids("jazz downtown", 0), strs(&["e1"]));
}
