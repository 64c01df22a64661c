//! Tokenizer and index invariants.

use crate::common::*;
use agora_core::{DocKey, EntityType};
use agora_search::tokenize;
use agora_storage::DocumentStore;
use proptest::prelude::*;

const VOCAB: &[&str] = &["alpha", "beta", "gamma", "delta", "omega"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tokenize_is_deterministic(s in "\\PC{0,64}") {
        prop_assert_eq!(tokenize(&s), tokenize(&s));
    }

    #[test]
    fn tokenize_ignores_repetition(s in "[A-Za-z0-9_#.,!' ]{0,48}") {
        let doubled = format!("{} {}", s, s);
        prop_assert_eq!(tokenize(&doubled), tokenize(&s));
    }

    #[test]
    fn tokens_are_lowercase_ascii_words(s in "\\PC{0,64}") {
        for token in tokenize(&s) {
            let word = token.strip_prefix('#').unwrap_or(&token);
            prop_assert!(!word.is_empty());
            prop_assert!(word
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }
    }

    #[test]
    fn every_indexed_token_finds_the_entity(text in "[A-Za-z0-9_# ]{0,40}") {
        let h = Harness::new();
        h.index(doc(EntityType::Media, "m1", &text, "", 7));
        for token in tokenize(&text) {
            prop_assert!(h.ids(&token).contains(&"m1".to_string()), "token {}", token);
        }
    }

    #[test]
    fn reindexing_is_idempotent(
        title in "[a-z#]{1,8}( [a-z#]{1,8}){0,5}",
        millis in 0i64..1_000_000_000_000,
    ) {
        let once = Harness::new();
        once.index(doc(EntityType::Products, "x", &title, "desc", millis));

        let twice = Harness::new();
        twice.index(doc(EntityType::Products, "x", &title, "desc", millis));
        twice.index(doc(EntityType::Products, "x", &title, "desc", millis));

        prop_assert_eq!(once.kv_state(), twice.kv_state());
        prop_assert_eq!(once.docs.len().unwrap(), twice.docs.len().unwrap());
    }

    #[test]
    fn and_returns_exactly_docs_with_both_tokens(
        docs in prop::collection::vec(prop::collection::vec(0usize..5, 0..5), 1..12),
        x in 0usize..5,
        y in 0usize..5,
    ) {
        let h = Harness::new();
        for (i, words) in docs.iter().enumerate() {
            let text: Vec<&str> = words.iter().map(|w| VOCAB[*w]).collect();
            h.index(doc(EntityType::Recipes, &format!("r{:02}", i), &text.join(" "), "", i as i64 + 1));
        }

        // Most recent first: higher index was created later
        let expected: Vec<String> = docs
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, words)| words.contains(&x) && words.contains(&y))
            .map(|(i, _)| format!("r{:02}", i))
            .collect();
        let query = format!("{} {}", VOCAB[x], VOCAB[y]);
        prop_assert_eq!(h.ids(&query), expected);
    }
}

#[test]
fn update_removes_stale_postings() {
    let h = Harness::new();
    h.index(doc(EntityType::Events, "d", "alpha beta", "", 1));
    h.update(doc(EntityType::Events, "d", "beta gamma", "", 1));
    assert!(h.ids("alpha").is_empty());
    assert_eq!(h.ids("gamma"), strs(&["d"]));
    assert_eq!(h.ids("beta"), strs(&["d"]));
}

#[test]
fn delete_purges_every_posting() {
    let h = Harness::new();
    h.index(doc(EntityType::FeedPosts, "p", "Loving #golang tips", "and #rust", 1));
    h.index(doc(EntityType::FeedPosts, "q", "golang", "", 2));
    h.delete(EntityType::FeedPosts, "p");

    for (key, members) in h.kv_state() {
        if key.starts_with("inverted:") || key.starts_with("hashtag:") {
            assert!(
                members.iter().all(|(id, _)| id != "p"),
                "{} still lists p",
                key
            );
        }
    }
    assert!(h
        .docs
        .get(&DocKey::new(EntityType::FeedPosts, "p"))
        .unwrap()
        .is_none());
    assert_eq!(h.ids("golang"), strs(&["q"]));
}

#[test]
fn shared_tokens_rank_by_recency() {
    let h = Harness::new();
    h.index(doc(EntityType::Songs, "s1", "blue train", "", 300));
    h.index(doc(EntityType::Songs, "s2", "blue train", "", 100));
    h.index(doc(EntityType::Songs, "s3", "blue train", "", 200));
    assert_eq!(h.ids("blue train"), strs(&["s1", "s3", "s2"]));
}

#[test]
fn hashtag_mention_outranks_bare_word() {
    let h = Harness::new();
    // Bare-word doc is newer, so only the boost can put the hashtag doc first
    h.index(doc(EntityType::FeedPosts, "tagged", "about #foo", "", 1));
    h.index(doc(EntityType::FeedPosts, "plain", "about foo", "", 2));
    assert_eq!(h.ids("#foo"), strs(&["tagged", "plain"]));
}

#[test]
fn delete_of_unknown_entity_succeeds() {
    let h = Harness::new();
    let out = h
        .core
        .delete_entity(&h.ctx(), EntityType::Users, "nobody")
        .unwrap();
    assert_eq!(out, agora_search::IndexOutcome::Skipped);
    // Twice, after a real delete too
    h.index(doc(EntityType::Users, "u1", "ana", "chef", 1));
    h.delete(EntityType::Users, "u1");
    h.delete(EntityType::Users, "u1");
    assert!(h.ids("ana").is_empty());
}

#[test]
fn suggestions_survive_deletes() {
    let h = Harness::new();
    h.index(doc(EntityType::Crops, "c1", "Rice", "grain", 1));
    h.delete(EntityType::Crops, "c1");
    assert_eq!(h.core.autocomplete_prefix("ri", 10), strs(&["rice"]));
}
