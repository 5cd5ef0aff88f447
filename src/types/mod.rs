//! Core types for the Sorting Hat engine

mod error;
mod item;
mod output;
mod pair;
mod reason;
mod screen;
mod state;

pub use error::QuizError;
pub use item::{Timing, Thresholds, IrtParams, LikertItem, ForcedChoiceOption, ForcedChoiceItem};
pub use output::{CategoryProbability, TraitScore, SortingResult};
pub use pair::{CategoryPair, PairKey, canonical_pair_key};
pub use reason::ReasonCode;
pub use screen::{Screen, ChoiceOption, InterludeTicket, INTERLUDE_MESSAGE};
pub use state::TieBreakerState;
