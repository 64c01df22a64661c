//! Parallel writers, readers and the worker pool.

use crate::common::*;
use agora_core::{ChangeEvent, DocKey, DomainRecord, EntityType, Method};
use agora_search::{tokenize, SearchConfig};
use agora_storage::DocumentStore;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

#[test]
fn parallel_writers_on_distinct_entities() {
    let h = Harness::new();
    std::thread::scope(|s| {
        for t in 0..THREADS {
            let h = &h;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    let id = format!("t{}-{}", t, i);
                    let title = format!("shared writer{} item{}", t, i);
                    h.index(doc(EntityType::Products, &id, &title, "", (t * PER_THREAD + i) as i64));
                }
            });
        }
    });

    let all = h.ids("shared");
    assert_eq!(all.len(), THREADS * PER_THREAD);
    assert_eq!(all.first().map(String::as_str), Some("t7-49"));
    assert_eq!(all.last().map(String::as_str), Some("t0-0"));
    assert_eq!(h.ids("shared writer3").len(), PER_THREAD);
    assert_eq!(h.ids("writer5 item7"), strs(&["t5-7"]));
}

#[test]
fn readers_see_consistent_growth_during_writes() {
    let h = Harness::new();
    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        let writer = {
            let h = &h;
            let done = &done;
            s.spawn(move || {
                for i in 0..200 {
                    h.index(doc(EntityType::Media, &format!("m{:03}", i), "sunset beach", "", i));
                }
                done.store(true, Ordering::SeqCst);
            })
        };
        for _ in 0..3 {
            let h = &h;
            let done = &done;
            s.spawn(move || {
                let mut last = 0;
                while !done.load(Ordering::SeqCst) {
                    let ids = h
                        .core
                        .try_search_ids(&h.ctx(), "sunset", 0)
                        .expect("query during writes");
                    assert!(ids.len() >= last, "posting list shrank");
                    // Recency order holds at every point
                    assert!(ids.windows(2).all(|w| w[0] > w[1]));
                    last = ids.len();
                }
            });
        }
        writer.join().unwrap();
    });
    assert_eq!(h.ids("sunset beach").len(), 200);
}

#[test]
fn worker_pool_applies_every_event() {
    let h = Harness::with_config(SearchConfig {
        workers: 4,
        queue_depth: 1024,
        ..SearchConfig::default()
    });
    let pool = h.core.start_workers().unwrap();
    for i in 0..200 {
        let id = format!("e{:03}", i);
        h.domain.insert(
            EntityType::Events,
            id.clone(),
            DomainRecord::new()
                .with("Title", "Street festival")
                .with("Date", i as i64),
        );
        pool.submit(ChangeEvent::new(EntityType::Events, id, Method::Post))
            .unwrap();
    }
    pool.drain();
    let stats = pool.stats();
    assert_eq!(stats.completed, 200);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.worker_count, 4);
    pool.shutdown();

    let ids = h.ids("festival");
    assert_eq!(ids.len(), 200);
    assert_eq!(ids[0], "e199");
    assert_eq!(h.core.search(EntityType::Events, "street", 5).len(), 5);
}

#[test]
fn racing_updates_converge_after_reconcile() {
    let h = Harness::new();
    h.index(doc(EntityType::Events, "e1", "start", "", 1));
    let texts = ["alpha beta", "beta gamma", "gamma delta", "delta alpha"];

    std::thread::scope(|s| {
        for t in 0..4 {
            let h = &h;
            s.spawn(move || {
                for round in 0..25 {
                    let text = texts[(t + round) % texts.len()];
                    h.update(doc(EntityType::Events, "e1", text, "", 1));
                }
            });
        }
    });

    h.core.reconcile(&h.ctx()).unwrap();

    let stored = h
        .docs
        .get(&DocKey::new(EntityType::Events, "e1"))
        .unwrap()
        .unwrap();
    let expected: BTreeSet<String> = tokenize(&stored.indexed_text()).into_iter().collect();
    for token in ["start", "alpha", "beta", "gamma", "delta"] {
        let posted = h.ids(token).contains(&"e1".to_string());
        assert_eq!(posted, expected.contains(token), "token {}", token);
    }
}
