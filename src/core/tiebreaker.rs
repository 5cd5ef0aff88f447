//! Tie breaker: bounded rounds of pairwise forced-choice questions
//!
//! Round setup:
//! - pairs = every unordered pair of the tie group, in list order
//! - questions per pair = 1 if the group has ≥ 4 members, else 2
//!
//! Each call to `handle` runs the transition loop until the host has to act,
//! and returns exactly one effect for it:
//! - ShowInterlude  → show the interlude, send InterludeElapsed after the delay
//! - AskPair        → fetch an item for the pair, send AnswerRecorded once scored
//! - NarrowTieGroup → recompute the tie group over the candidates, send it back
//! - Resolve        → show results
//!
//! The machine never touches scores itself.

use tracing::{debug, info};

use crate::types::{CategoryPair, ForcedChoiceItem, QuizError, ReasonCode, TieBreakerState};
use crate::LARGE_TIE_GROUP;

/// Inputs to the tie breaker
#[derive(Debug, Clone, PartialEq)]
pub enum TieBreakerEvent {
    /// Start the first round
    Begin,
    /// The interlude delay has passed
    InterludeElapsed,
    /// The pending question was answered and scored
    AnswerRecorded,
    /// Tie group recomputed over the candidates of the finished round
    TieGroupNarrowed(Vec<String>),
}

/// What the host must do next
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowInterlude,
    AskPair {
        pair: CategoryPair,
        /// 1-based question number within the round
        number: u32,
        /// Questions planned for the round
        total: u32,
    },
    NarrowTieGroup { candidates: Vec<String> },
    Resolve,
}

/// Result of one `handle` call
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: TieBreakerState,
    pub effect: Effect,
    pub reason: ReasonCode,
}

/// Tie-breaker round state
#[derive(Debug, Clone)]
pub struct TieBreaker {
    state: TieBreakerState,
    tie_group: Vec<String>,
    rounds_remaining: u32,
    rounds_started: u32,
    interlude_shown: bool,

    pairs: Vec<CategoryPair>,
    pair_index: usize,
    questions_per_pair: u32,
    remaining_for_pair: u32,
    round_answered: u32,
    round_planned: u32,

    pending_item: Option<ForcedChoiceItem>,
}

impl TieBreaker {
    /// New tie breaker over `tie_group` with at most `rounds` rounds
    pub fn new(tie_group: Vec<String>, rounds: u32) -> Self {
        let mut tb = Self {
            state: TieBreakerState::Idle,
            tie_group,
            rounds_remaining: rounds,
            rounds_started: 0,
            interlude_shown: false,
            pairs: Vec::new(),
            pair_index: 0,
            questions_per_pair: 0,
            remaining_for_pair: 0,
            round_answered: 0,
            round_planned: 0,
            pending_item: None,
        };
        tb.prepare_round();
        tb
    }

    /// Feed an event and run until the host must act
    pub fn handle(&mut self, event: TieBreakerEvent) -> Result<Step, QuizError> {
        match event {
            TieBreakerEvent::Begin if self.state == TieBreakerState::Idle => {
                info!(
                    group = ?self.tie_group,
                    rounds = self.rounds_remaining,
                    "tie breaker started"
                );
                Ok(self.advance())
            }

            TieBreakerEvent::InterludeElapsed if self.state == TieBreakerState::AwaitingInterlude => {
                debug!(reason = ReasonCode::T002_INTERLUDE_ELAPSED.code(), "interlude over");
                Ok(self.advance())
            }

            TieBreakerEvent::AnswerRecorded
                if matches!(self.state, TieBreakerState::AwaitingAnswer { .. }) =>
            {
                self.pending_item = None;
                self.round_answered += 1;
                self.remaining_for_pair = self.remaining_for_pair.saturating_sub(1);
                debug!(
                    reason = ReasonCode::T003_ANSWER_RECORDED.code(),
                    answered = self.round_answered,
                    planned = self.round_planned,
                    "answer recorded"
                );
                Ok(self.advance())
            }

            TieBreakerEvent::TieGroupNarrowed(group) if self.state == TieBreakerState::BetweenRounds => {
                if let Some(outsider) = group.iter().find(|c| !self.tie_group.contains(c)) {
                    return Err(QuizError::UnknownCategory(outsider.clone()));
                }
                self.tie_group = group;
                if self.tie_group.len() <= 1 {
                    return Ok(self.resolve(ReasonCode::T001_TIE_BROKEN));
                }
                self.prepare_round();
                debug!(
                    reason = ReasonCode::T004_NEXT_ROUND.code(),
                    group = ?self.tie_group,
                    "next round"
                );
                Ok(self.advance())
            }

            event => Err(QuizError::OutOfPhase(format!(
                "tie breaker in {} cannot take {:?}",
                self.state, event
            ))),
        }
    }

    /// Transition loop
    fn advance(&mut self) -> Step {
        loop {
            if self.tie_group.len() <= 1 {
                return self.resolve(ReasonCode::T001_TIE_BROKEN);
            }
            if self.rounds_remaining == 0 {
                return self.resolve(ReasonCode::T001_ROUNDS_EXHAUSTED);
            }

            if !self.interlude_shown {
                self.interlude_shown = true;
                self.rounds_started += 1;
                return self.step(
                    TieBreakerState::AwaitingInterlude,
                    Effect::ShowInterlude,
                    ReasonCode::T002_INTERLUDE_SHOWN,
                );
            }

            if self.remaining_for_pair > 0 {
                let pair = self.pairs[self.pair_index].clone();
                let number = self.round_answered + 1;
                return self.step(
                    TieBreakerState::AwaitingAnswer {
                        pair: pair.clone(),
                        index: number,
                    },
                    Effect::AskPair {
                        pair,
                        number,
                        total: self.round_planned,
                    },
                    ReasonCode::T003_ASK_PAIR,
                );
            }

            self.pair_index += 1;
            if self.pair_index < self.pairs.len() {
                self.remaining_for_pair = self.questions_per_pair;
                self.state = TieBreakerState::BetweenPairs;
                debug!(
                    reason = ReasonCode::T004_NEXT_PAIR.code(),
                    pair = %self.pairs[self.pair_index],
                    "next pair"
                );
                continue;
            }

            self.rounds_remaining -= 1;
            if self.rounds_remaining == 0 {
                return self.resolve(ReasonCode::T001_ROUNDS_EXHAUSTED);
            }

            let candidates = self.tie_group.clone();
            return self.step(
                TieBreakerState::BetweenRounds,
                Effect::NarrowTieGroup { candidates },
                ReasonCode::T004_ROUND_COMPLETE,
            );
        }
    }

    /// Build pairs and counters for a round over the current tie group
    fn prepare_round(&mut self) {
        self.pairs = CategoryPair::all_pairs(&self.tie_group);
        self.questions_per_pair = if self.tie_group.len() >= LARGE_TIE_GROUP { 1 } else { 2 };
        self.pair_index = 0;
        self.remaining_for_pair = if self.pairs.is_empty() { 0 } else { self.questions_per_pair };
        self.round_answered = 0;
        self.round_planned = self.pairs.len() as u32 * self.questions_per_pair;
        self.interlude_shown = false;
        self.pending_item = None;
    }

    fn resolve(&mut self, reason: ReasonCode) -> Step {
        info!(
            reason = reason.code(),
            group = ?self.tie_group,
            rounds_started = self.rounds_started,
            "tie breaker resolved"
        );
        self.pending_item = None;
        self.step(TieBreakerState::Resolved, Effect::Resolve, reason)
    }

    fn step(&mut self, state: TieBreakerState, effect: Effect, reason: ReasonCode) -> Step {
        self.state = state.clone();
        Step { state, effect, reason }
    }

    // -------------------------------------------------------------------------
    // Pending item
    // -------------------------------------------------------------------------

    /// Remember the item shown for the current question
    pub fn set_pending_item(&mut self, item: ForcedChoiceItem) -> Result<(), QuizError> {
        match &self.state {
            TieBreakerState::AwaitingAnswer { pair, .. } if *pair == item.category_pair => {
                self.pending_item = Some(item);
                Ok(())
            }
            TieBreakerState::AwaitingAnswer { pair, .. } => Err(QuizError::OutOfPhase(format!(
                "item '{}' is for {}, question is for {}",
                item.id, item.category_pair, pair
            ))),
            state => Err(QuizError::OutOfPhase(format!(
                "no question pending (state {})",
                state
            ))),
        }
    }

    pub fn pending_item(&self) -> Option<&ForcedChoiceItem> {
        self.pending_item.as_ref()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn state(&self) -> &TieBreakerState {
        &self.state
    }

    pub fn tie_group(&self) -> &[String] {
        &self.tie_group
    }

    pub fn rounds_remaining(&self) -> u32 {
        self.rounds_remaining
    }

    /// Rounds begun so far (the current one included)
    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    pub fn round_pairs(&self) -> &[CategoryPair] {
        &self.pairs
    }

    pub fn questions_per_pair(&self) -> u32 {
        self.questions_per_pair
    }

    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForcedChoiceOption, Timing};
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fc_item(a: &str, b: &str) -> ForcedChoiceItem {
        ForcedChoiceItem {
            id: format!("{}-{}", a, b),
            category_pair: CategoryPair::new(a, b),
            stem: "Pick one".to_string(),
            options: [
                ForcedChoiceOption { key: "A".to_string(), text: a.to_string(), category: a.to_string() },
                ForcedChoiceOption { key: "B".to_string(), text: b.to_string(), category: b.to_string() },
            ],
            timing: Timing::default(),
        }
    }

    /// Answer every question of the current round, returning the pairs asked
    fn run_round(tb: &mut TieBreaker, mut step: Step) -> (Vec<String>, Step) {
        let mut asked = Vec::new();
        while let Effect::AskPair { pair, .. } = &step.effect {
            asked.push(format!("{}{}", pair.first, pair.second));
            step = tb.handle(TieBreakerEvent::AnswerRecorded).unwrap();
        }
        (asked, step)
    }

    #[test]
    fn test_single_member_resolves_immediately() {
        let mut tb = TieBreaker::new(names(&["A"]), 3);
        let step = tb.handle(TieBreakerEvent::Begin).unwrap();
        assert_eq!(step.effect, Effect::Resolve);
        assert_eq!(step.reason, ReasonCode::T001_TIE_BROKEN);
        assert!(tb.is_resolved());
    }

    #[test]
    fn test_zero_budget_resolves_immediately() {
        let mut tb = TieBreaker::new(names(&["A", "B"]), 0);
        let step = tb.handle(TieBreakerEvent::Begin).unwrap();
        assert_eq!(step.effect, Effect::Resolve);
        assert_eq!(step.reason, ReasonCode::T001_ROUNDS_EXHAUSTED);
    }

    #[test]
    fn test_begin_shows_interlude_first() {
        let mut tb = TieBreaker::new(names(&["A", "B"]), 2);
        let step = tb.handle(TieBreakerEvent::Begin).unwrap();
        assert_eq!(step.effect, Effect::ShowInterlude);
        assert_eq!(step.state, TieBreakerState::AwaitingInterlude);
        assert_eq!(tb.rounds_started(), 1);
    }

    #[test]
    fn test_small_group_asks_twice_per_pair() {
        let mut tb = TieBreaker::new(names(&["A", "B", "C"]), 1);
        assert_eq!(tb.questions_per_pair(), 2);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        assert_eq!(
            step.effect,
            Effect::AskPair { pair: CategoryPair::new("A", "B"), number: 1, total: 6 }
        );
        let (asked, _) = run_round(&mut tb, step);
        assert_eq!(asked, vec!["AB", "AB", "AC", "AC", "BC", "BC"]);
    }

    #[test]
    fn test_large_group_asks_once_per_pair() {
        let mut tb = TieBreaker::new(names(&["A", "B", "C", "D"]), 1);
        assert_eq!(tb.questions_per_pair(), 1);
        assert_eq!(tb.round_pairs().len(), 6);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        let (asked, last) = run_round(&mut tb, step);
        assert_eq!(asked, vec!["AB", "AC", "AD", "BC", "BD", "CD"]);
        assert_eq!(last.effect, Effect::Resolve);
    }

    #[test]
    fn test_single_round_budget_resolves_despite_residual_tie() {
        let mut tb = TieBreaker::new(names(&["A", "B", "C"]), 1);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        let (_, last) = run_round(&mut tb, step);
        assert_eq!(last.state, TieBreakerState::Resolved);
        assert_eq!(last.reason, ReasonCode::T001_ROUNDS_EXHAUSTED);
        assert_eq!(tb.rounds_remaining(), 0);
    }

    #[test]
    fn test_round_end_requests_narrowing_then_new_round() {
        let mut tb = TieBreaker::new(names(&["A", "B", "C"]), 2);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        let (_, end) = run_round(&mut tb, step);
        assert_eq!(end.effect, Effect::NarrowTieGroup { candidates: names(&["A", "B", "C"]) });
        assert_eq!(end.state, TieBreakerState::BetweenRounds);

        // interlude again for the new round
        let step = tb.handle(TieBreakerEvent::TieGroupNarrowed(names(&["A", "C"]))).unwrap();
        assert_eq!(step.effect, Effect::ShowInterlude);
        assert_eq!(tb.rounds_started(), 2);

        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        let (asked, last) = run_round(&mut tb, step);
        assert_eq!(asked, vec!["AC", "AC"]);
        assert_eq!(last.effect, Effect::Resolve);
    }

    #[test]
    fn test_narrowing_to_one_resolves() {
        let mut tb = TieBreaker::new(names(&["A", "B"]), 3);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        run_round(&mut tb, step);
        let step = tb.handle(TieBreakerEvent::TieGroupNarrowed(names(&["B"]))).unwrap();
        assert_eq!(step.effect, Effect::Resolve);
        assert_eq!(step.reason, ReasonCode::T001_TIE_BROKEN);
        assert_eq!(tb.tie_group(), &names(&["B"])[..]);
    }

    #[test]
    fn test_narrowing_cannot_add_categories() {
        let mut tb = TieBreaker::new(names(&["A", "B"]), 3);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let step = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        run_round(&mut tb, step);
        let err = tb.handle(TieBreakerEvent::TieGroupNarrowed(names(&["A", "D"]))).unwrap_err();
        assert!(matches!(err, QuizError::UnknownCategory(c) if c == "D"));
        assert_eq!(tb.state(), &TieBreakerState::BetweenRounds);
    }

    #[test]
    fn test_out_of_phase_events_rejected() {
        let mut tb = TieBreaker::new(names(&["A", "B"]), 2);
        assert!(matches!(
            tb.handle(TieBreakerEvent::AnswerRecorded),
            Err(QuizError::OutOfPhase(_))
        ));
        tb.handle(TieBreakerEvent::Begin).unwrap();
        assert!(matches!(
            tb.handle(TieBreakerEvent::Begin),
            Err(QuizError::OutOfPhase(_))
        ));
        // a second resumption for the same interlude is refused
        tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        assert!(matches!(
            tb.handle(TieBreakerEvent::InterludeElapsed),
            Err(QuizError::OutOfPhase(_))
        ));
    }

    #[test]
    fn test_pending_item_must_match_pair() {
        let mut tb = TieBreaker::new(names(&["A", "B", "C"]), 1);
        assert!(tb.set_pending_item(fc_item("A", "B")).is_err());

        tb.handle(TieBreakerEvent::Begin).unwrap();
        tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        assert!(tb.set_pending_item(fc_item("A", "C")).is_err());
        tb.set_pending_item(fc_item("B", "A")).unwrap();
        assert!(tb.pending_item().is_some());

        tb.handle(TieBreakerEvent::AnswerRecorded).unwrap();
        assert!(tb.pending_item().is_none());
    }

    #[test]
    fn test_question_numbers_count_within_round() {
        let mut tb = TieBreaker::new(names(&["A", "B"]), 1);
        tb.handle(TieBreakerEvent::Begin).unwrap();
        let first = tb.handle(TieBreakerEvent::InterludeElapsed).unwrap();
        let second = tb.handle(TieBreakerEvent::AnswerRecorded).unwrap();
        assert_eq!(
            second.state,
            TieBreakerState::AwaitingAnswer { pair: CategoryPair::new("A", "B"), index: 2 }
        );
        assert!(matches!(first.effect, Effect::AskPair { number: 1, total: 2, .. }));
        assert!(matches!(second.effect, Effect::AskPair { number: 2, total: 2, .. }));
    }
}
