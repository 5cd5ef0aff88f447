//! Core modules for the Sorting Hat engine

pub mod timing;
pub mod latent;
pub mod tie;
pub mod scoring;
pub mod tiebreaker;
pub mod rotation;
pub mod bank;
pub mod engine;
pub mod session;
pub mod scheduler;
pub mod driver;

pub use timing::response_time_weight;
pub use latent::{estimate_latent_level, category_midpoints, ThetaBounds};
pub use tie::resolve_tie_group;
pub use scoring::{softmax, sigmoid, CategoryModel, ScoringConfig, ScoringState};
pub use tiebreaker::{Effect, Step, TieBreaker, TieBreakerEvent};
pub use rotation::ForcedChoiceRotation;
pub use bank::{ItemBank, QuizMode, CATEGORIES_FILE, FORCED_CHOICE_FILE, LIKERT_FILE};
pub use engine::{ForcedChoiceOutcome, SortingEngine};
pub use session::QuizSession;
pub use scheduler::{Callback, CancelHandle, ManualScheduler, Scheduler, TokioScheduler};
pub use driver::{QuizDriver, ScreenUpdate};
