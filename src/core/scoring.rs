//! Scoring state: trait accumulation, category aggregation, forced-choice nudges
//!
//! One owned record per quiz session. Trait scores only ever grow by Likert
//! answers; category scores are recomputed wholesale from them, except that
//! forced-choice answers perturb two category scores directly. After the first
//! forced-choice answer, category scores are no longer a pure function of
//! trait scores, and a later `recompute()` discards those nudges.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::latent::{estimate_latent_level, ThetaBounds};
use crate::core::tie::resolve_tie_group;
use crate::core::timing::response_time_weight;
use crate::types::{CategoryProbability, LikertItem, QuizError, TraitScore};
use crate::{FC_LEARNING_RATE, TIE_THRESHOLD};

/// Tunables of the scoring engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Probability gap within which categories tie
    pub tie_threshold: f64,
    /// Forced-choice learning rate
    pub learning_rate: f64,
    pub theta_bounds: ThetaBounds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tie_threshold: TIE_THRESHOLD,
            learning_rate: FC_LEARNING_RATE,
            theta_bounds: ThetaBounds::default(),
        }
    }
}

// =============================================================================
// CATEGORY MODEL
// =============================================================================

/// Trait list, category list and the category × trait weight matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryModel {
    traits: Vec<String>,
    categories: Vec<String>,
    /// weights[category][trait], traits missing from a row weigh 0
    weights: Vec<Vec<f64>>,
    trait_index: HashMap<String, usize>,
    category_index: HashMap<String, usize>,
}

impl CategoryModel {
    /// Build and validate the model
    pub fn new(
        traits: Vec<String>,
        categories: Vec<String>,
        weights: &BTreeMap<String, BTreeMap<String, f64>>,
    ) -> Result<Self, QuizError> {
        let trait_index = index_names(&traits, "trait")?;
        let category_index = index_names(&categories, "category")?;

        for category in weights.keys() {
            if !category_index.contains_key(category) {
                return Err(QuizError::InvalidWeights(format!(
                    "weights given for unknown category '{}'",
                    category
                )));
            }
        }

        let mut matrix = Vec::with_capacity(categories.len());
        for category in &categories {
            let row = weights.get(category).ok_or_else(|| {
                QuizError::InvalidWeights(format!("no weights for category '{}'", category))
            })?;

            let mut dense = vec![0.0; traits.len()];
            for (trait_name, &w) in row {
                let idx = trait_index.get(trait_name).ok_or_else(|| {
                    QuizError::InvalidWeights(format!(
                        "category '{}' weights unknown trait '{}'",
                        category, trait_name
                    ))
                })?;
                if !w.is_finite() {
                    return Err(QuizError::InvalidWeights(format!(
                        "weight {}/{} is not finite",
                        category, trait_name
                    )));
                }
                dense[*idx] = w;
            }
            matrix.push(dense);
        }

        Ok(Self {
            traits,
            categories,
            weights: matrix,
            trait_index,
            category_index,
        })
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn trait_index(&self, name: &str) -> Option<usize> {
        self.trait_index.get(name).copied()
    }

    pub fn category_index(&self, name: &str) -> Option<usize> {
        self.category_index.get(name).copied()
    }
}

fn index_names(names: &[String], kind: &str) -> Result<HashMap<String, usize>, QuizError> {
    if names.is_empty() {
        return Err(QuizError::InvalidWeights(format!("no {} names configured", kind)));
    }
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(QuizError::InvalidWeights(format!("blank {} name", kind)));
        }
        if index.insert(name.clone(), i).is_some() {
            return Err(QuizError::InvalidWeights(format!("duplicate {} '{}'", kind, name)));
        }
    }
    Ok(index)
}

// =============================================================================
// SOFTMAX
// =============================================================================

/// Numerically stable softmax (max subtracted before exponentiating)
///
/// An all-equal vector, including all zeros, gives the uniform distribution.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// =============================================================================
// SCORING STATE
// =============================================================================

/// Mutable scores of one quiz session
#[derive(Debug, Clone)]
pub struct ScoringState {
    model: Arc<CategoryModel>,
    config: ScoringConfig,
    trait_scores: Vec<f64>,
    category_scores: Vec<f64>,
    probabilities: Vec<f64>,
}

impl ScoringState {
    /// Zero scores, uniform probabilities
    pub fn new(model: Arc<CategoryModel>, config: ScoringConfig) -> Self {
        let n_traits = model.traits.len();
        let n_categories = model.categories.len();
        let mut state = Self {
            model,
            config,
            trait_scores: vec![0.0; n_traits],
            category_scores: vec![0.0; n_categories],
            probabilities: vec![0.0; n_categories],
        };
        state.recompute();
        state
    }

    /// Back to zero scores
    pub fn reset(&mut self) {
        self.trait_scores.iter_mut().for_each(|s| *s = 0.0);
        self.recompute();
    }

    // -------------------------------------------------------------------------
    // Trait accumulation
    // -------------------------------------------------------------------------

    /// Add one Likert answer to the trait scores
    ///
    /// points = theta(response) × a × time weight × trait weight, summed
    /// without normalization. Category scores are left alone until
    /// `recompute()`. Fails, without touching any score, if the item names a
    /// trait outside the model.
    pub fn record_likert(
        &mut self,
        item: &LikertItem,
        response: f64,
        response_time_secs: f64,
    ) -> Result<(), QuizError> {
        let mut targets = Vec::with_capacity(item.trait_weights.len());
        for (trait_name, &trait_weight) in &item.trait_weights {
            let idx = self.model.trait_index(trait_name).ok_or_else(|| QuizError::UnknownTrait {
                item_id: item.id.clone(),
                name: trait_name.clone(),
            })?;
            targets.push((idx, trait_weight));
        }

        let weight = response_time_weight(&item.timing, response_time_secs);
        let latent = estimate_latent_level(response, &item.irt.thresholds, self.config.theta_bounds);
        let base_points = latent * item.irt.a;

        for (idx, trait_weight) in targets {
            self.trait_scores[idx] += base_points * weight * trait_weight;
        }

        trace!(
            item = %item.id,
            response,
            latent,
            time_weight = weight,
            "likert answer accumulated"
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Category aggregation
    // -------------------------------------------------------------------------

    /// Category scores from trait scores, then probabilities
    pub fn recompute(&mut self) {
        for (c, row) in self.model.weights.iter().enumerate() {
            self.category_scores[c] = row
                .iter()
                .zip(&self.trait_scores)
                .map(|(w, s)| w * s)
                .sum();
        }
        self.refresh_probabilities();
    }

    fn refresh_probabilities(&mut self) {
        self.probabilities = softmax(&self.category_scores);
    }

    // -------------------------------------------------------------------------
    // Forced-choice adjustment
    // -------------------------------------------------------------------------

    /// Elo-style nudge after the respondent picked `chosen` over `other`
    ///
    /// delta = learning rate × time weight × (1 − σ(score_chosen − score_other)).
    /// Returns the delta applied. Probabilities of every category are refreshed.
    pub fn apply_forced_choice(
        &mut self,
        chosen: &str,
        other: &str,
        time_weight: f64,
    ) -> Result<f64, QuizError> {
        let c = self
            .model
            .category_index(chosen)
            .ok_or_else(|| QuizError::UnknownCategory(chosen.to_string()))?;
        let o = self
            .model
            .category_index(other)
            .ok_or_else(|| QuizError::UnknownCategory(other.to_string()))?;

        let predicted_chosen_wins = sigmoid(self.category_scores[c] - self.category_scores[o]);
        let error = 1.0 - predicted_chosen_wins;
        let delta = self.config.learning_rate * time_weight * error;

        self.category_scores[c] += delta;
        self.category_scores[o] -= delta;
        self.refresh_probabilities();

        debug!(chosen, other, time_weight, delta, "forced-choice adjustment");
        Ok(delta)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Current distribution in configured category order
    pub fn probabilities(&self) -> Vec<CategoryProbability> {
        self.model
            .categories
            .iter()
            .zip(&self.probabilities)
            .map(|(name, &p)| CategoryProbability {
                category: name.clone(),
                probability: p,
            })
            .collect()
    }

    pub fn probability(&self, category: &str) -> Option<f64> {
        self.model.category_index(category).map(|i| self.probabilities[i])
    }

    pub fn category_score(&self, category: &str) -> Option<f64> {
        self.model.category_index(category).map(|i| self.category_scores[i])
    }

    pub fn trait_score(&self, trait_name: &str) -> Option<f64> {
        self.model.trait_index(trait_name).map(|i| self.trait_scores[i])
    }

    /// Highest-probability category; the first in configured order wins ties
    pub fn top_category(&self) -> &str {
        let mut best = 0;
        for (i, &p) in self.probabilities.iter().enumerate().skip(1) {
            if p > self.probabilities[best] {
                best = i;
            }
        }
        &self.model.categories[best]
    }

    /// Categories within `threshold` of the best probability
    ///
    /// With `subset`, both the maximum and the membership are taken over the
    /// subset only, so a narrowed group cannot regrow.
    pub fn tie_group(&self, threshold: f64, subset: Option<&[String]>) -> Result<Vec<String>, QuizError> {
        let candidates = subset.unwrap_or(&self.model.categories);
        resolve_tie_group(threshold, candidates, |name| self.probability(name))
    }

    /// Trait scores in configured trait order
    pub fn trait_snapshot(&self) -> Vec<TraitScore> {
        self.model
            .traits
            .iter()
            .zip(&self.trait_scores)
            .map(|(name, &score)| TraitScore {
                trait_name: name.clone(),
                score,
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
