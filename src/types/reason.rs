//! Reason codes for tie-breaker decisions

use serde::{Deserialize, Serialize};

/// Why the tie breaker moved to its current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // T001: Resolution
    // =========================================================================
    /// Tie group has one member (or none)
    T001_TIE_BROKEN,
    /// Round budget spent, residual tie accepted
    T001_ROUNDS_EXHAUSTED,

    // =========================================================================
    // T002: Interlude
    // =========================================================================
    /// Interlude shown at the start of a round
    T002_INTERLUDE_SHOWN,
    /// Interlude delay elapsed
    T002_INTERLUDE_ELAPSED,

    // =========================================================================
    // T003: Questions
    // =========================================================================
    /// Asking the next question for the current pair
    T003_ASK_PAIR,
    /// Answer recorded for the current pair
    T003_ANSWER_RECORDED,

    // =========================================================================
    // T004: Round progression
    // =========================================================================
    /// Moving to the next pair of the round
    T004_NEXT_PAIR,
    /// Round complete, tie group must be narrowed
    T004_ROUND_COMPLETE,
    /// New round built from the narrowed tie group
    T004_NEXT_ROUND,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::T001_TIE_BROKEN => "T001_TIE_BROKEN",
            Self::T001_ROUNDS_EXHAUSTED => "T001_ROUNDS_EXHAUSTED",
            Self::T002_INTERLUDE_SHOWN => "T002_INTERLUDE_SHOWN",
            Self::T002_INTERLUDE_ELAPSED => "T002_INTERLUDE_ELAPSED",
            Self::T003_ASK_PAIR => "T003_ASK_PAIR",
            Self::T003_ANSWER_RECORDED => "T003_ANSWER_RECORDED",
            Self::T004_NEXT_PAIR => "T004_NEXT_PAIR",
            Self::T004_ROUND_COMPLETE => "T004_ROUND_COMPLETE",
            Self::T004_NEXT_ROUND => "T004_NEXT_ROUND",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::T001_TIE_BROKEN => "Tie broken",
            Self::T001_ROUNDS_EXHAUSTED => "No rounds left",
            Self::T002_INTERLUDE_SHOWN => "Interlude before round",
            Self::T002_INTERLUDE_ELAPSED => "Interlude finished",
            Self::T003_ASK_PAIR => "Asking about current pair",
            Self::T003_ANSWER_RECORDED => "Answer recorded",
            Self::T004_NEXT_PAIR => "Moving to next pair",
            Self::T004_ROUND_COMPLETE => "Round complete",
            Self::T004_NEXT_ROUND => "Starting next round",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
