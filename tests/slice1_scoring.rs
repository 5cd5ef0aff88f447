//! Integration tests for Slice 1 - Likert scoring
//!
//! Tests the scoring contract end to end through a loaded bank:
//! - response time weighting anchors
//! - latent level → trait points → category softmax
//! - probability vector invariants

use serde_json::json;
use sortinghat::core::{response_time_weight, softmax, ItemBank, ScoringConfig, SortingEngine};
use sortinghat::types::{QuizError, Timing};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn two_category_bank() -> ItemBank {
    let categories = json!({
        "traits": ["T1", "T2"],
        "categories": ["H1", "H2"],
        "weights": { "H1": { "T1": 1.0 }, "H2": { "T2": 1.0 } }
    });
    let likert = json!({
        "items": [
            {
                "id": "L1",
                "text": "T1 statement",
                "trait_weights": { "T1": 1.0 },
                "irt": { "a": 1.0, "thresholds": { "b1": -2.0, "b2": -1.0, "b3": 1.0, "b4": 2.0 } }
            },
            {
                "id": "L2",
                "text": "T2 statement",
                "trait_weights": { "T2": 1.0 },
                "irt": { "a": 1.0, "thresholds": { "b1": -2.0, "b2": -1.0, "b3": 1.0, "b4": 2.0 } }
            }
        ]
    });
    let forced_choice = json!({
        "items": [{
            "id": "F1",
            "category_pair": ["H1", "H2"],
            "stem": "Pick one",
            "options": [
                { "key": "A", "text": "first", "category": "H1" },
                { "key": "B", "text": "second", "category": "H2" }
            ]
        }]
    });
    ItemBank::from_json_strs(&categories.to_string(), &likert.to_string(), &forced_choice.to_string()).unwrap()
}

fn engine(bank: &ItemBank) -> SortingEngine {
    SortingEngine::new(bank, ScoringConfig::default(), StdRng::seed_from_u64(1))
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
// RESPONSE TIME WEIGHT
// =============================================================================

#[test]
fn test_time_weight_anchors() {
    let t = Timing::default();
    assert_eq!(response_time_weight(&t, 0.0), 0.0);
    assert_eq!(response_time_weight(&t, t.rapid_threshold_sec), t.down_weight_factor);
    assert_eq!(response_time_weight(&t, t.expected_time_sec), 1.0);
    assert_eq!(response_time_weight(&t, -1.0), 0.0);
    assert_eq!(response_time_weight(&t, f64::NAN), 0.0);
}

#[test]
fn test_time_weight_non_decreasing() {
    let t = Timing::default();
    let mut last = 0.0;
    for step in 0..=300 {
        let w = response_time_weight(&t, step as f64 * 0.1);
        assert!(w >= last, "weight dropped at {}s", step as f64 * 0.1);
        assert!((0.0..=1.0).contains(&w));
        last = w;
    }
}

// =============================================================================
// LIKERT ANSWERS
// =============================================================================

#[test]
fn test_top_answer_full_weight() {
    let bank = two_category_bank();
    let mut engine = engine(&bank);
    let item = bank.likert_item("L1").unwrap().clone();

    engine.record_likert_answer(&item, 5.0, 12.0).unwrap();
    engine.recompute_and_get_probabilities();

    let traits = engine.trait_snapshot();
    assert_eq!(traits[0].trait_name, "T1");
    assert!((traits[0].score - 2.5).abs() < 1e-12);
    assert_eq!(traits[1].score, 0.0);

    assert!((probability(&engine, "H1") - 0.924).abs() < 1e-3);
    assert!((probability(&engine, "H2") - 0.076).abs() < 1e-3);
    assert_eq!(engine.top_category(), "H1");
}

#[test]
fn test_rapid_answer_counts_less() {
    let bank = two_category_bank();
    let item = bank.likert_item("L1").unwrap().clone();

    let mut careful = engine(&bank);
    careful.record_likert_answer(&item, 5.0, 12.0).unwrap();
    let mut rushed = engine(&bank);
    rushed.record_likert_answer(&item, 5.0, 1.0).unwrap();

    // 1s of a 5s rapid window → 0.5 × 1/5 = 0.1 weight
    assert!((rushed.trait_snapshot()[0].score - 0.25).abs() < 1e-12);
    assert!(careful.trait_snapshot()[0].score > rushed.trait_snapshot()[0].score);
}

#[test]
fn test_scores_accumulate_without_clamping() {
    let bank = two_category_bank();
    let mut engine = engine(&bank);
    let item = bank.likert_item("L1").unwrap().clone();
    for _ in 0..10 {
        engine.record_likert_answer(&item, 5.0, 30.0).unwrap();
    }
    assert!((engine.trait_snapshot()[0].score - 25.0).abs() < 1e-9);
}

// =============================================================================
// DISTRIBUTION INVARIANTS
// =============================================================================

#[test]
fn test_fresh_distribution_is_uniform() {
    let bank = ItemBank::builtin().unwrap();
    let mut engine = engine(&bank);
    let probs = engine.recompute_and_get_probabilities();
    assert_eq!(probs.len(), 4);
    for p in probs {
        assert!((p.probability - 0.25).abs() < 1e-12);
    }
}

#[test]
fn test_distribution_sums_to_one_after_mixed_answers() {
    let bank = ItemBank::builtin().unwrap();
    let mut engine = engine(&bank);
    for (i, item) in bank.likert_items().iter().enumerate() {
        let response = 1.0 + (i % 9) as f64 * 0.5;
        engine.record_likert_answer(item, response, 3.0 + i as f64).unwrap();
    }
    let probs = engine.recompute_and_get_probabilities();
    let total: f64 = probs.iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(probs.iter().all(|p| p.probability >= 0.0));

    // idempotent without intervening answers
    assert_eq!(probs, engine.recompute_and_get_probabilities());
}

#[test]
fn test_softmax_shift_invariance() {
    let scores = [0.4, -1.2, 2.2, 0.0];
    let base = softmax(&scores);
    let shifted = softmax(&scores.map(|s| s - 40.0));
    for (a, b) in base.iter().zip(&shifted) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_tie_group_threshold_zero_keeps_exact_maxima() {
    let bank = two_category_bank();
    let engine = engine(&bank);
    assert_eq!(engine.tie_group(0.0, None).unwrap(), vec!["H1".to_string(), "H2".to_string()]);
}

#[test]
fn test_tie_group_threshold_zero_over_trailing_subset() {
    let bank = ItemBank::builtin().unwrap();
    let mut engine = engine(&bank);
    let item = engine.request_next_forced_choice_item("Slytherin", "Gryffindor").unwrap();
    let key = item
        .options
        .iter()
        .find(|o| o.category == "Slytherin")
        .map(|o| o.key.clone())
        .unwrap();
    engine.apply_forced_choice_answer(&item, &key, 30.0).unwrap();
    assert_eq!(engine.top_category(), "Slytherin");

    // the subset maximum is the untouched pair, not the global leader
    let subset: Vec<String> = ["Gryffindor", "Hufflepuff", "Ravenclaw"].iter().map(|s| s.to_string()).collect();
    assert_eq!(
        engine.tie_group(0.0, Some(&subset)).unwrap(),
        vec!["Hufflepuff".to_string(), "Ravenclaw".to_string()]
    );
}

#[test]
fn test_tie_group_after_clear_lead() {
    let bank = two_category_bank();
    let mut engine = engine(&bank);
    let item = bank.likert_item("L2").unwrap().clone();
    engine.record_likert_answer(&item, 5.0, 20.0).unwrap();
    engine.recompute_and_get_probabilities();

    assert_eq!(engine.top_category(), "H2");
    assert_eq!(engine.tie_group(0.25, None).unwrap(), vec!["H2".to_string()]);
    assert_eq!(engine.tie_group(0.9, None).unwrap().len(), 2);
}

#[test]
fn test_tie_group_rejects_unknown_subset_member() {
    let bank = two_category_bank();
    let engine = engine(&bank);
    let subset = vec!["H1".to_string(), "H9".to_string()];
    assert!(matches!(
        engine.tie_group(0.25, Some(&subset)),
        Err(QuizError::UnknownCategory(_))
    ));
}
