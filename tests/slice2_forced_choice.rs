//! Integration tests for Slice 2 - Forced choice
//!
//! Tests the forced-choice contract:
//! - logistic (Elo-style) update with time weighting
//! - option key resolution, case-insensitive, unknown keys rejected
//! - rotation: no repeat within a cycle, reshuffle once exhausted

use std::collections::HashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sortinghat::core::{ForcedChoiceRotation, ItemBank, ScoringConfig, SortingEngine};
use serde_json::json;
use sortinghat::types::QuizError;

fn engine(seed: u64) -> SortingEngine {
    let bank = ItemBank::builtin().unwrap();
    SortingEngine::new(&bank, ScoringConfig::default(), StdRng::seed_from_u64(seed))
}

fn probability(engine: &SortingEngine, category: &str) -> f64 {
    engine
        .probabilities()
        .into_iter()
        .find(|p| p.category == category)
        .map(|p| p.probability)
        .unwrap()
}

// =============================================================================
// PAIRWISE UPDATE
// =============================================================================

#[test]
fn test_pick_from_even_scores() {
    let mut engine = engine(1);
    let item = engine.request_next_forced_choice_item("Gryffindor", "Hufflepuff").unwrap();
    let key = item
        .options
        .iter()
        .find(|o| o.category == "Gryffindor")
        .map(|o| o.key.clone())
        .unwrap();

    let outcome = engine.apply_forced_choice_answer(&item, &key, 30.0).unwrap();
    assert!((outcome.delta - 0.05).abs() < 1e-12);

    let scoring = engine.scoring();
    assert!((scoring.category_score("Gryffindor").unwrap() - 0.05).abs() < 1e-12);
    assert!((scoring.category_score("Hufflepuff").unwrap() + 0.05).abs() < 1e-12);

    // four categories: softmax([0.05, -0.05, 0, 0])
    let total: f64 = [0.05f64, -0.05, 0.0, 0.0].iter().map(|s| s.exp()).sum();
    assert!((probability(&engine, "Gryffindor") - 0.05f64.exp() / total).abs() < 1e-12);
    assert!((probability(&engine, "Ravenclaw") - 1.0 / total).abs() < 1e-12);
}

#[test]
fn test_outside_categories_keep_scores_but_shift_probability() {
    let mut engine = engine(2);
    let before = probability(&engine, "Slytherin");
    let item = engine.request_next_forced_choice_item("Ravenclaw", "Hufflepuff").unwrap();
    engine.apply_forced_choice_answer(&item, "A", 30.0).unwrap();

    assert_eq!(engine.scoring().category_score("Slytherin"), Some(0.0));
    let after = probability(&engine, "Slytherin");
    assert!(after != before);
    let total: f64 = engine.probabilities().iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_repeated_wins_shrink() {
    let mut engine = engine(3);
    let mut deltas = Vec::new();
    for _ in 0..4 {
        let item = engine.request_next_forced_choice_item("Slytherin", "Ravenclaw").unwrap();
        let key = item
            .options
            .iter()
            .find(|o| o.category == "Slytherin")
            .map(|o| o.key.clone())
            .unwrap();
        deltas.push(engine.apply_forced_choice_answer(&item, &key, 30.0).unwrap().delta);
    }
    for pair in deltas.windows(2) {
        assert!(pair[1] < pair[0], "deltas should shrink: {:?}", deltas);
    }
}

#[test]
fn test_zero_time_answer_changes_nothing() {
    let mut engine = engine(4);
    let item = engine.request_next_forced_choice_item("Gryffindor", "Slytherin").unwrap();
    let outcome = engine.apply_forced_choice_answer(&item, "B", 0.0).unwrap();
    assert_eq!(outcome.time_weight, 0.0);
    assert_eq!(outcome.delta, 0.0);
    assert_eq!(probability(&engine, "Gryffindor"), 0.25);
}

// =============================================================================
// OPTION KEYS
// =============================================================================

#[test]
fn test_option_keys_ignore_case_and_whitespace() {
    let mut engine = engine(5);
    let item = engine.request_next_forced_choice_item("Hufflepuff", "Slytherin").unwrap();
    let outcome = engine.apply_forced_choice_answer(&item, " b ", 30.0).unwrap();
    assert_eq!(outcome.chosen, item.options[1].category);
}

#[test]
fn test_unknown_option_key_is_configuration_error() {
    let mut engine = engine(6);
    let item = engine.request_next_forced_choice_item("Hufflepuff", "Slytherin").unwrap();
    let err = engine.apply_forced_choice_answer(&item, "C", 30.0).unwrap_err();
    assert!(matches!(err, QuizError::UnknownOptionKey { ref key, .. } if key == "C"));
    assert!(err.is_configuration_error());
    assert_eq!(err.code(), "E103_UNKNOWN_OPTION_KEY");
}

// =============================================================================
// ROTATION
// =============================================================================

#[test]
fn test_rotation_cycles_without_repeats() {
    let bank = ItemBank::builtin().unwrap();
    let mut rotation = ForcedChoiceRotation::new(bank.forced_choice_items(), StdRng::seed_from_u64(9));
    let n = rotation.deck_size("Gryffindor", "Ravenclaw");
    assert!(n >= 2);

    let first_cycle: HashSet<String> = (0..n)
        .map(|_| rotation.next_item("Ravenclaw", "Gryffindor").unwrap().id)
        .collect();
    assert_eq!(first_cycle.len(), n);
    assert_eq!(rotation.reshuffles("Gryffindor", "Ravenclaw"), 0);

    // N + 1th request restarts the cycle exactly once
    rotation.next_item("Gryffindor", "Ravenclaw").unwrap();
    assert_eq!(rotation.reshuffles("Gryffindor", "Ravenclaw"), 1);
    for _ in 1..n {
        rotation.next_item("Gryffindor", "Ravenclaw").unwrap();
    }
    assert_eq!(rotation.reshuffles("Gryffindor", "Ravenclaw"), 1);
}

#[test]
fn test_rotation_only_serves_requested_pair() {
    let mut engine = engine(7);
    for _ in 0..5 {
        let item = engine.request_next_forced_choice_item("Hufflepuff", "Gryffindor").unwrap();
        assert!(item.category_pair.contains("Hufflepuff"));
        assert!(item.category_pair.contains("Gryffindor"));
    }
}

#[test]
fn test_pipe_in_category_names_keeps_pairs_apart() {
    let categories = json!({
        "traits": ["T"],
        "categories": ["A", "A|B", "B|C", "C"],
        "weights": { "A": { "T": 1.0 }, "A|B": {}, "B|C": {}, "C": {} }
    });
    let forced_choice = json!({
        "items": [{
            "id": "F1",
            "category_pair": ["A", "B|C"],
            "stem": "Which?",
            "options": [
                { "key": "A", "text": "a", "category": "A" },
                { "key": "B", "text": "b", "category": "B|C" }
            ]
        }]
    });
    let bank = ItemBank::from_json_strs(
        &categories.to_string(),
        &json!({ "items": [] }).to_string(),
        &forced_choice.to_string(),
    )
    .unwrap();
    let mut engine = SortingEngine::new(&bank, ScoringConfig::default(), StdRng::seed_from_u64(10));

    assert_eq!(engine.request_next_forced_choice_item("B|C", "A").unwrap().id, "F1");
    let err = engine.request_next_forced_choice_item("A|B", "C").unwrap_err();
    assert!(matches!(err, QuizError::NoItemsForPair(_)));
}

#[test]
fn test_unknown_pair_has_no_items() {
    let mut engine = engine(8);
    let err = engine.request_next_forced_choice_item("Gryffindor", "Durmstrang").unwrap_err();
    assert!(matches!(err, QuizError::NoItemsForPair(_)));
    assert!(err.is_configuration_error());
}
