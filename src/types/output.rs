//! Output structures for terminal and JSON display

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Probability of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProbability {
    pub category: String,
    pub probability: f64,
}

/// Accumulated score of one trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitScore {
    #[serde(rename = "trait")]
    pub trait_name: String,
    pub score: f64,
}

/// Final outcome of a quiz run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingResult {
    pub timestamp: DateTime<Utc>,
    /// Winning category (first maximum in configured order)
    pub category: String,
    /// Distribution in configured category order
    pub probabilities: Vec<CategoryProbability>,
    /// Trait profile in configured trait order
    pub traits: Vec<TraitScore>,
    /// Likert answers recorded
    pub likert_answers: usize,
    /// Forced-choice answers recorded
    pub forced_choice_answers: usize,
}

impl SortingResult {
    pub fn new(
        category: String,
        probabilities: Vec<CategoryProbability>,
        traits: Vec<TraitScore>,
        likert_answers: usize,
        forced_choice_answers: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            probabilities,
            traits,
            likert_answers,
            forced_choice_answers,
        }
    }

    /// Probability of the winning category
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .iter()
            .find(|p| p.category == self.category)
            .map(|p| p.probability)
            .unwrap_or(0.0)
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let mut out = format!(
            "{} {}\n",
            "Sorted into".bold(),
            self.category.to_uppercase().green().bold()
        );
        for p in &self.probabilities {
            let bar = "█".repeat((p.probability * 30.0).round() as usize);
            let line = format!("  {:<12} {:>6.1}% {}", p.category, p.probability * 100.0, bar);
            if p.category == self.category {
                out.push_str(&format!("{}\n", line.green()));
            } else {
                out.push_str(&format!("{}\n", line.dimmed()));
            }
        }
        out
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let dist: Vec<String> = self
            .probabilities
            .iter()
            .map(|p| format!("{}={:.3}", p.category, p.probability))
            .collect();
        format!(
            "category={} | p={:.3} | likert={} | forced_choice={} | {}",
            self.category,
            self.confidence(),
            self.likert_answers,
            self.forced_choice_answers,
            dist.join(" ")
        )
    }
}
