//! Literal walkthroughs of indexing, updating, deleting and querying.

use crate::common::*;
use agora_core::EntityType;

fn jazz_night(h: &Harness) {
    h.index(doc(
        EntityType::Events,
        "e1",
        "Jazz Night",
        "Live music downtown",
        1_000,
    ));
}

fn two_jazz_events(h: &Harness) {
    jazz_night(h);
    h.index(doc(EntityType::Events, "e2", "Jazz Brunch", "Morning", 2_000));
}

fn golang_posts(h: &Harness) {
    h.index(doc(EntityType::FeedPosts, "p1", "Loving #golang", "", 10));
    h.index(doc(EntityType::FeedPosts, "p2", "golang rocks", "", 20));
}

#[test]
fn index_then_query_single_entity() {
    let h = Harness::new();
    jazz_night(&h);
    assert_eq!(h.ids("jazz"), strs(&["e1"]));
    assert_eq!(h.ids("live music"), strs(&["e1"]));
    assert_eq!(h.ids("the live"), strs(&["e1"]));
}

#[test]
fn shared_token_orders_by_recency() {
    let h = Harness::new();
    two_jazz_events(&h);
    assert_eq!(h.ids("jazz"), strs(&["e2", "e1"]));
}

#[test]
fn update_moves_entity_between_tokens() {
    let h = Harness::new();
    two_jazz_events(&h);
    h.update(doc(EntityType::Events, "e1", "Rock Night", "Loud", 3_000));
    assert_eq!(h.ids("jazz"), strs(&["e2"]));
    assert_eq!(h.ids("rock"), strs(&["e1"]));
    assert_eq!(h.ids("night"), strs(&["e1"]));
}

#[test]
fn hashtag_query_boosts_hashtag_posts() {
    let h = Harness::new();
    golang_posts(&h);
    assert_eq!(h.ids("#golang"), strs(&["p1", "p2"]));

    let ranked = h
        .retriever()
        .boosted_search(&h.ctx(), &strs(&["#golang"]), 0)
        .unwrap();
    let scores: Vec<_> = ranked.iter().map(|s| (s.entity_id.as_str(), s.score)).collect();
    assert_eq!(scores, vec![("p1", 10), ("p2", 3)]);
}

#[test]
fn delete_leaves_remaining_hashtag_results() {
    let h = Harness::new();
    golang_posts(&h);
    h.delete(EntityType::FeedPosts, "p1");
    assert_eq!(h.ids("golang"), strs(&["p2"]));
    assert_eq!(h.ids("#golang"), strs(&["p2"]));

    let ranked = h
        .retriever()
        .boosted_search(&h.ctx(), &strs(&["#golang"]), 0)
        .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].score, 3);
}

#[test]
fn autocomplete_after_indexing() {
    let h = Harness::new();
    two_jazz_events(&h);
    let suggestions = h.core.autocomplete_prefix("ja", 10);
    assert!(suggestions.contains(&"jazz".to_string()));
}

#[test]
fn hydrated_search_returns_records_in_rank_order() {
    let h = Harness::new();
    two_jazz_events(&h);
    let hits = h.core.search(EntityType::Events, "jazz", 10);
    let ids: Vec<_> = hits.iter().map(|hit| hit.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["e2", "e1"]);
    assert_eq!(hits[0].record.text("Title").as_deref(), Some("Jazz Brunch"));

    let limited = h.core.search(EntityType::Events, "jazz", 1);
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].entity_id, "e2");
}

#[test]
fn search_all_groups_by_type() {
    let h = Harness::new();
    jazz_night(&h);
    h.index(doc(EntityType::Places, "pl1", "Jazz Cellar", "bar", 500));
    let all = h.core.search_all("jazz", 10);
    assert_eq!(
        all.keys().copied().collect::<Vec<_>>(),
        vec![EntityType::Events, EntityType::Places]
    );
    assert_eq!(all[&EntityType::Places][0].entity_id, "pl1");
}

#[test]
fn stopword_only_query_is_empty() {
    let h = Harness::new();
    jazz_night(&h);
    assert!(h.ids("the of and").is_empty());
    assert!(h.core.search(EntityType::Events, "", 10).is_empty());
}

#[test]
fn and_query_requires_every_token() {
    let h = Harness::new();
    two_jazz_events(&h);
    assert_eq!(h.ids("jazz morning"), strs(&["e2"]));
    assert!(h.ids("jazz opera").is_empty());
}

#[test]
fn same_id_in_two_types_survives_delete_of_one() {
    let h = Harness::new();
    h.index(doc(EntityType::Events, "x1", "Jazz Night", "", 1_000));
    h.index(doc(EntityType::Places, "x1", "Jazz Cellar", "", 2_000));
    h.index(doc(EntityType::Places, "x2", "Jazz Bar", "", 1_500));
    assert_eq!(h.ids("jazz"), strs(&["x1", "x2"]));

    h.delete(EntityType::Events, "x1");
    assert_eq!(h.ids("jazz"), strs(&["x1", "x2"]));
    assert!(h.ids("night").is_empty());
    assert_eq!(h.ids("cellar"), strs(&["x1"]));
    let hits = h.core.search(EntityType::Places, "jazz", 10);
    let ids: Vec<_> = hits.iter().map(|hit| hit.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["x1", "x2"]);

    // Once no document under x1 produces the token, its posting goes
    h.update(doc(EntityType::Places, "x1", "Wine Cellar", "", 2_000));
    assert_eq!(h.ids("jazz"), strs(&["x2"]));
}

#[test]
fn same_id_in_two_types_ranks_by_newest() {
    let h = Harness::new();
    h.index(doc(EntityType::Places, "x1", "Jazz Cellar", "", 3_000));
    h.index(doc(EntityType::Events, "x2", "Jazz Brunch", "", 2_000));
    // An older namesake must not pull x1 behind x2
    h.index(doc(EntityType::Events, "x1", "Jazz Night", "", 1_000));
    assert_eq!(h.ids("jazz"), strs(&["x1", "x2"]));

    h.update(doc(EntityType::Events, "x1", "Rock Night", "", 1_000));
    assert_eq!(h.ids("jazz"), strs(&["x1", "x2"]));
}
