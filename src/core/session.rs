//! Quiz session: Likert phase, tie check, tie breaker, results
//!
//! The session owns everything that lives for one quiz run: the selected
//! Likert items, the scoring engine and, once a tie is found, the tie
//! breaker. It executes the tie breaker's effects and exposes the next
//! step as a `Screen`.
//!
//! Interludes are the only suspension point. Each one hands out an
//! `InterludeTicket`; `resume_interlude` accepts a ticket only once and only
//! for the current generation, so a timer left over from before a reset
//! cannot touch the new run.

use std::sync::Arc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::core::bank::{ItemBank, QuizMode};
use crate::core::engine::SortingEngine;
use crate::core::scoring::ScoringConfig;
use crate::core::tiebreaker::{Effect, Step, TieBreaker, TieBreakerEvent};
use crate::types::{
    ChoiceOption, ForcedChoiceItem, InterludeTicket, LikertItem, QuizError, Screen, SortingResult,
    INTERLUDE_MESSAGE,
};

/// One quiz run, restartable with `reset`
#[derive(Debug)]
pub struct QuizSession {
    bank: Arc<ItemBank>,
    config: ScoringConfig,
    rng: StdRng,
    mode: QuizMode,
    engine: SortingEngine,

    likert_items: Vec<LikertItem>,
    likert_position: usize,
    tie_breaker: Option<TieBreaker>,
    result: Option<SortingResult>,

    generation: u64,
    next_serial: u64,
    pending_ticket: Option<InterludeTicket>,

    likert_answers: usize,
    forced_choice_answers: usize,
    screen: Option<Screen>,
}

impl QuizSession {
    /// Start a session; the first screen is ready on return
    pub fn new(
        bank: Arc<ItemBank>,
        mode: QuizMode,
        config: ScoringConfig,
        mut rng: StdRng,
    ) -> Result<Self, QuizError> {
        let engine = SortingEngine::new(&bank, config, StdRng::seed_from_u64(rng.gen()));
        let mut session = Self {
            bank,
            config,
            rng,
            mode,
            engine,
            likert_items: Vec::new(),
            likert_position: 0,
            tie_breaker: None,
            result: None,
            generation: 0,
            next_serial: 0,
            pending_ticket: None,
            likert_answers: 0,
            forced_choice_answers: 0,
            screen: None,
        };
        session.start()?;
        Ok(session)
    }

    /// Session with default scoring and a seeded rng
    pub fn with_seed(bank: Arc<ItemBank>, mode: QuizMode, seed: u64) -> Result<Self, QuizError> {
        Self::new(bank, mode, ScoringConfig::default(), StdRng::seed_from_u64(seed))
    }

    fn start(&mut self) -> Result<Screen, QuizError> {
        self.likert_items = self.bank.select_likert_items(self.mode, &mut self.rng);
        info!(
            mode = %self.mode,
            generation = self.generation,
            likert = self.likert_items.len(),
            "quiz session started"
        );
        if self.likert_items.is_empty() {
            return self.finish_likert_phase();
        }
        Ok(self.show(self.likert_screen(0)))
    }

    /// Drop the current run and begin a new one
    ///
    /// Any interlude ticket handed out before the reset becomes stale.
    pub fn reset(&mut self, mode: QuizMode) -> Result<Screen, QuizError> {
        self.generation += 1;
        self.pending_ticket = None;
        self.tie_breaker = None;
        self.result = None;
        self.mode = mode;
        self.engine = SortingEngine::new(&self.bank, self.config, StdRng::seed_from_u64(self.rng.gen()));
        self.likert_position = 0;
        self.likert_answers = 0;
        self.forced_choice_answers = 0;
        self.screen = None;
        debug!(generation = self.generation, "session reset");
        self.start()
    }

    // -------------------------------------------------------------------------
    // Likert phase
    // -------------------------------------------------------------------------

    fn likert_screen(&self, position: usize) -> Screen {
        let item = &self.likert_items[position];
        Screen::Likert {
            item_id: item.id.clone(),
            text: item.text.clone(),
            number: position + 1,
            total: self.likert_items.len(),
        }
    }

    /// Item awaiting a Likert answer, if any
    pub fn current_likert_item(&self) -> Option<&LikertItem> {
        if self.tie_breaker.is_some() || self.result.is_some() {
            return None;
        }
        self.likert_items.get(self.likert_position)
    }

    /// Record the answer to the current Likert item
    pub fn submit_likert(&mut self, response: f64, response_time_secs: f64) -> Result<Screen, QuizError> {
        let item = self
            .current_likert_item()
            .cloned()
            .ok_or_else(|| QuizError::OutOfPhase("no likert question is pending".to_string()))?;

        self.engine.record_likert_answer(&item, response, response_time_secs)?;
        self.likert_answers += 1;
        self.likert_position += 1;

        if self.likert_position < self.likert_items.len() {
            return Ok(self.show(self.likert_screen(self.likert_position)));
        }
        self.finish_likert_phase()
    }

    /// Aggregate, check for a tie, and either finish or start the tie breaker
    fn finish_likert_phase(&mut self) -> Result<Screen, QuizError> {
        self.engine.recompute_and_get_probabilities();
        let group = self.engine.tie_group(self.config.tie_threshold, None)?;
        info!(group = ?group, "likert phase complete");

        if group.len() <= 1 {
            return Ok(self.finish());
        }

        let mut tie_breaker = TieBreaker::new(group, self.mode.rounds());
        let step = tie_breaker.handle(TieBreakerEvent::Begin)?;
        self.tie_breaker = Some(tie_breaker);
        self.drive(step)
    }

    // -------------------------------------------------------------------------
    // Tie breaker
    // -------------------------------------------------------------------------

    fn tie_breaker_mut(&mut self) -> Result<&mut TieBreaker, QuizError> {
        self.tie_breaker
            .as_mut()
            .ok_or_else(|| QuizError::OutOfPhase("no tie breaker is running".to_string()))
    }

    /// Execute tie-breaker effects until one needs the respondent
    fn drive(&mut self, mut step: Step) -> Result<Screen, QuizError> {
        loop {
            debug!(state = %step.state, reason = step.reason.code(), "tie breaker step");
            match step.effect {
                Effect::ShowInterlude => {
                    let ticket = InterludeTicket {
                        generation: self.generation,
                        serial: self.next_serial,
                    };
                    self.next_serial += 1;
                    self.pending_ticket = Some(ticket);
                    return Ok(self.show(Screen::Interlude {
                        message: INTERLUDE_MESSAGE.to_string(),
                        ticket,
                    }));
                }
                Effect::AskPair { pair, number, total } => {
                    let item = self
                        .engine
                        .request_next_forced_choice_item(&pair.first, &pair.second)?;
                    let screen = forced_choice_screen(&item, number, total);
                    self.tie_breaker_mut()?.set_pending_item(item)?;
                    return Ok(self.show(screen));
                }
                Effect::NarrowTieGroup { candidates } => {
                    let group = self
                        .engine
                        .tie_group(self.config.tie_threshold, Some(&candidates))?;
                    step = self
                        .tie_breaker_mut()?
                        .handle(TieBreakerEvent::TieGroupNarrowed(group))?;
                }
                Effect::Resolve => return Ok(self.finish()),
            }
        }
    }

    /// Resume after an interlude
    ///
    /// Returns `None`, changing nothing, for a stale or repeated ticket.
    pub fn resume_interlude(&mut self, ticket: InterludeTicket) -> Result<Option<Screen>, QuizError> {
        if ticket.generation != self.generation || self.pending_ticket != Some(ticket) {
            warn!(
                ticket_generation = ticket.generation,
                ticket_serial = ticket.serial,
                generation = self.generation,
                "ignoring stale interlude resumption"
            );
            return Ok(None);
        }
        self.pending_ticket = None;
        let step = self.tie_breaker_mut()?.handle(TieBreakerEvent::InterludeElapsed)?;
        self.drive(step).map(Some)
    }

    /// Record the answer to the pending forced-choice item
    ///
    /// An unknown key is rejected and the same question stays pending.
    pub fn submit_forced_choice(&mut self, option_key: &str, response_time_secs: f64) -> Result<Screen, QuizError> {
        let item = self
            .tie_breaker
            .as_ref()
            .and_then(|tb| tb.pending_item())
            .cloned()
            .ok_or_else(|| QuizError::OutOfPhase("no forced-choice question is pending".to_string()))?;

        let outcome = self
            .engine
            .apply_forced_choice_answer(&item, option_key, response_time_secs)?;
        self.forced_choice_answers += 1;
        debug!(
            item = %item.id,
            chosen = %outcome.chosen,
            delta = outcome.delta,
            "forced-choice answer scored"
        );

        let step = self.tie_breaker_mut()?.handle(TieBreakerEvent::AnswerRecorded)?;
        self.drive(step)
    }

    // -------------------------------------------------------------------------
    // Results
    // -------------------------------------------------------------------------

    fn finish(&mut self) -> Screen {
        let result = SortingResult::new(
            self.engine.top_category().to_string(),
            self.engine.probabilities(),
            self.engine.trait_snapshot(),
            self.likert_answers,
            self.forced_choice_answers,
        );
        info!(
            category = %result.category,
            confidence = result.confidence(),
            forced_choice = self.forced_choice_answers,
            "quiz session resolved"
        );
        self.tie_breaker = None;
        self.pending_ticket = None;
        self.result = Some(result.clone());
        self.show(Screen::Results(result))
    }

    fn show(&mut self, screen: Screen) -> Screen {
        debug!(screen = screen.kind(), "show");
        self.screen = Some(screen.clone());
        screen
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Screen last produced (always set once the session is constructed)
    pub fn current_screen(&self) -> Option<&Screen> {
        self.screen.as_ref()
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_ticket(&self) -> Option<InterludeTicket> {
        self.pending_ticket
    }

    pub fn engine(&self) -> &SortingEngine {
        &self.engine
    }

    pub fn tie_breaker(&self) -> Option<&TieBreaker> {
        self.tie_breaker.as_ref()
    }

    pub fn result(&self) -> Option<&SortingResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn likert_total(&self) -> usize {
        self.likert_items.len()
    }
}

fn forced_choice_screen(item: &ForcedChoiceItem, number: u32, total: u32) -> Screen {
    let [left, right] = &item.options;
    Screen::ForcedChoice {
        item_id: item.id.clone(),
        stem: item.stem.clone(),
        left: ChoiceOption {
            key: left.key.clone(),
            text: left.text.clone(),
        },
        right: ChoiceOption {
            key: right.key.clone(),
            text: right.text.clone(),
        },
        number,
        total,
    }
}

// =============================================================================
// TESTS
// =============================================================================
