//! What the presentation layer should show next

use serde::{Deserialize, Serialize};
use crate::types::SortingResult;

/// Message shown during the pause before a tie-breaker round
pub const INTERLUDE_MESSAGE: &str =
    "Oh my, difficult - very difficult indeed...\n\nHmm... where you will truly thrive\nis not obvious at all...";

/// Identifies one interlude suspension of one session
///
/// Resuming with a ticket that does not match the live session (older
/// generation, or a serial already consumed) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterludeTicket {
    pub generation: u64,
    pub serial: u64,
}

/// A forced-choice option as shown to the respondent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: String,
    pub text: String,
}

/// The next screen of a quiz session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// Rate a statement 1-5
    Likert {
        item_id: String,
        text: String,
        /// 1-based
        number: usize,
        total: usize,
    },
    /// Pause before a tie-breaker round; resume with the ticket after the delay
    Interlude {
        message: String,
        ticket: InterludeTicket,
    },
    /// Pick one of two options
    ForcedChoice {
        item_id: String,
        stem: String,
        left: ChoiceOption,
        right: ChoiceOption,
        /// 1-based question number within the round
        number: u32,
        /// Questions planned for the round
        total: u32,
    },
    /// Session finished
    Results(SortingResult),
}

impl Screen {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Screen::Likert { .. } => "likert",
            Screen::Interlude { .. } => "interlude",
            Screen::ForcedChoice { .. } => "forced_choice",
            Screen::Results(_) => "results",
        }
    }

    pub fn is_results(&self) -> bool {
        matches!(self, Screen::Results(_))
    }
}
