//! Sorting engine: the scoring surface the presentation layer calls into
//!
//! Wraps one session's scoring state and the forced-choice rotation.
//! Every call is synchronous and deterministic for a given rng seed.

use std::sync::Arc;
use rand::rngs::StdRng;

use crate::core::bank::ItemBank;
use crate::core::rotation::ForcedChoiceRotation;
use crate::core::scoring::{CategoryModel, ScoringConfig, ScoringState};
use crate::core::timing::response_time_weight;
use crate::types::{CategoryProbability, ForcedChoiceItem, LikertItem, QuizError, TraitScore};

/// What a forced-choice answer did to the scores
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedChoiceOutcome {
    pub chosen: String,
    pub other: String,
    pub time_weight: f64,
    /// Amount added to `chosen` and taken from `other`
    pub delta: f64,
}

/// Scoring engine for one quiz session
#[derive(Debug, Clone)]
pub struct SortingEngine {
    scoring: ScoringState,
    rotation: ForcedChoiceRotation,
}

impl SortingEngine {
    pub fn new(bank: &ItemBank, config: ScoringConfig, rng: StdRng) -> Self {
        Self::from_parts(bank.model(), bank.forced_choice_items(), config, rng)
    }

    pub fn from_parts(
        model: Arc<CategoryModel>,
        forced_choice_items: &[ForcedChoiceItem],
        config: ScoringConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            scoring: ScoringState::new(model, config),
            rotation: ForcedChoiceRotation::new(forced_choice_items, rng),
        }
    }

    pub fn scoring(&self) -> &ScoringState {
        &self.scoring
    }

    pub fn record_likert_answer(
        &mut self,
        item: &LikertItem,
        response: f64,
        response_time_secs: f64,
    ) -> Result<(), QuizError> {
        self.scoring.record_likert(item, response, response_time_secs)
    }

    /// Re-aggregate trait scores and return the fresh distribution
    ///
    /// Discards any forced-choice nudges applied since the last recompute.
    pub fn recompute_and_get_probabilities(&mut self) -> Vec<CategoryProbability> {
        self.scoring.recompute();
        self.scoring.probabilities()
    }

    /// Current distribution without recomputing
    pub fn probabilities(&self) -> Vec<CategoryProbability> {
        self.scoring.probabilities()
    }

    pub fn top_category(&self) -> &str {
        self.scoring.top_category()
    }

    pub fn tie_group(&self, threshold: f64, subset: Option<&[String]>) -> Result<Vec<String>, QuizError> {
        self.scoring.tie_group(threshold, subset)
    }

    pub fn trait_snapshot(&self) -> Vec<TraitScore> {
        self.scoring.trait_snapshot()
    }

    pub fn request_next_forced_choice_item(&mut self, a: &str, b: &str) -> Result<ForcedChoiceItem, QuizError> {
        self.rotation.next_item(a, b)
    }

    /// Score a forced-choice pick
    ///
    /// The key is matched case-insensitively against the item's options.
    /// Nothing changes when the key is unknown.
    pub fn apply_forced_choice_answer(
        &mut self,
        item: &ForcedChoiceItem,
        option_key: &str,
        response_time_secs: f64,
    ) -> Result<ForcedChoiceOutcome, QuizError> {
        let option = item.option_for_key(option_key).ok_or_else(|| QuizError::UnknownOptionKey {
            item_id: item.id.clone(),
            key: option_key.to_string(),
        })?;
        let chosen = option.category.clone();
        let other = item
            .category_pair
            .other(&chosen)
            .ok_or_else(|| QuizError::InvalidItem {
                item_id: item.id.clone(),
                detail: format!("option category '{}' is not in {}", chosen, item.category_pair),
            })?
            .to_string();

        let time_weight = response_time_weight(&item.timing, response_time_secs);
        let delta = self.scoring.apply_forced_choice(&chosen, &other, time_weight)?;

        Ok(ForcedChoiceOutcome {
            chosen,
            other,
            time_weight,
            delta,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
