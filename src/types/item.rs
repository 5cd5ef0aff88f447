//! Validated item records
//!
//! These are produced by the item bank after validation and never change
//! afterwards. Raw file shapes live in `core::bank`.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::types::CategoryPair;
use crate::{DEFAULT_DOWN_WEIGHT_FACTOR, DEFAULT_EXPECTED_TIME_SEC, DEFAULT_RAPID_THRESHOLD_SEC};

/// Response-time weighting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Full weight at or beyond this many seconds
    pub expected_time_sec: f64,
    /// Answers at or below this many seconds ramp from 0 to the down-weight factor
    pub rapid_threshold_sec: f64,
    /// Weight reached at the rapid threshold, in (0, 1)
    pub down_weight_factor: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            expected_time_sec: DEFAULT_EXPECTED_TIME_SEC,
            rapid_threshold_sec: DEFAULT_RAPID_THRESHOLD_SEC,
            down_weight_factor: DEFAULT_DOWN_WEIGHT_FACTOR,
        }
    }
}

/// Graded-response category thresholds, ordered b1 ≤ b2 ≤ b3 ≤ b4
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    pub b4: f64,
}

impl Thresholds {
    pub fn new(b1: f64, b2: f64, b3: f64, b4: f64) -> Self {
        Self { b1, b2, b3, b4 }
    }

    pub fn is_ordered(&self) -> bool {
        self.b1 <= self.b2 && self.b2 <= self.b3 && self.b3 <= self.b4
    }

    pub fn is_finite(&self) -> bool {
        [self.b1, self.b2, self.b3, self.b4].iter().all(|b| b.is_finite())
    }
}

/// IRT parameters of a Likert item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrtParams {
    /// Model label from the item file (e.g. "GRM"), informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Discrimination (a)
    pub a: f64,
    pub thresholds: Thresholds,
}

/// A 1-5 Likert statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikertItem {
    pub id: String,
    /// Statement shown to the respondent
    pub text: String,
    /// Trait → weight applied to this item's points
    pub trait_weights: BTreeMap<String, f64>,
    pub irt: IrtParams,
    pub timing: Timing,
}

/// One side of a forced-choice item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedChoiceOption {
    /// Key the respondent submits (matched case-insensitively)
    pub key: String,
    pub text: String,
    /// Category this option stands for
    #[serde(alias = "house")]
    pub category: String,
}

/// A binary scenario comparing two categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForcedChoiceItem {
    pub id: String,
    pub category_pair: CategoryPair,
    /// Prompt shown above the two options
    pub stem: String,
    pub options: [ForcedChoiceOption; 2],
    pub timing: Timing,
}

impl ForcedChoiceItem {
    /// Find the option for a submitted key
    pub fn option_for_key(&self, key: &str) -> Option<&ForcedChoiceOption> {
        let key = key.trim();
        self.options.iter().find(|o| o.key.trim().eq_ignore_ascii_case(key))
    }
}

// =============================================================================
// TESTS
// =============================================================================
