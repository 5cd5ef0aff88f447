//! Tie-breaker state definitions

use serde::{Deserialize, Serialize};
use crate::types::CategoryPair;

/// States of the forced-choice tie breaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "state")]
pub enum TieBreakerState {
    /// Constructed, not yet started
    Idle,
    /// Interlude shown, waiting for the host to signal the delay elapsed
    AwaitingInterlude,
    /// A forced-choice question is on screen for `pair`
    AwaitingAnswer {
        pair: CategoryPair,
        /// 1-based question number within the current round
        index: u32,
    },
    /// Current pair exhausted, moving to the next one
    BetweenPairs,
    /// Round finished, waiting for the narrowed tie group
    BetweenRounds,
    /// Tie broken or round budget spent
    Resolved,
}

impl TieBreakerState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TieBreakerState::Resolved)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            TieBreakerState::Idle => "\x1b[90m",                  // Gray
            TieBreakerState::AwaitingInterlude => "\x1b[35m",     // Magenta
            TieBreakerState::AwaitingAnswer { .. } => "\x1b[33m", // Yellow
            TieBreakerState::BetweenPairs => "\x1b[36m",          // Cyan
            TieBreakerState::BetweenRounds => "\x1b[36m",         // Cyan
            TieBreakerState::Resolved => "\x1b[32m",              // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for TieBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TieBreakerState::Idle => write!(f, "IDLE"),
            TieBreakerState::AwaitingInterlude => write!(f, "AWAITING_INTERLUDE"),
            TieBreakerState::AwaitingAnswer { pair, index } => {
                write!(f, "AWAITING_ANSWER({}, #{})", pair, index)
            }
            TieBreakerState::BetweenPairs => write!(f, "BETWEEN_PAIRS"),
            TieBreakerState::BetweenRounds => write!(f, "BETWEEN_ROUNDS"),
            TieBreakerState::Resolved => write!(f, "RESOLVED"),
        }
    }
}
