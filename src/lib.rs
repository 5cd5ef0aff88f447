//! Sorting Hat: adaptive house-sorting quiz engine
//!
//! Likert answers → IRT latent estimate × response-time weight → trait scores
//! → category softmax → tie check → forced-choice tie breaker → result

pub mod core;
pub mod types;

// =============================================================================
// TIE BREAKING
// =============================================================================

/// Probability gap to the leader within which categories count as tied
pub const TIE_THRESHOLD: f64 = 0.25;

/// Learning rate for the logistic forced-choice update
pub const FC_LEARNING_RATE: f64 = 0.1;

/// Pause shown before each tie-breaker round (milliseconds)
pub const INTERLUDE_DELAY_MS: u64 = 6000;

/// Tie groups this large get one question per pair, smaller groups get two
pub const LARGE_TIE_GROUP: usize = 4;

// =============================================================================
// LATENT TRAIT BOUNDS
// =============================================================================

/// Lower bound of the latent trait scale (theta)
pub const THETA_MIN: f64 = -3.0;

/// Upper bound of the latent trait scale (theta)
pub const THETA_MAX: f64 = 3.0;

// =============================================================================
// DEFAULT TIMING - used when an item file carries no timing block
// =============================================================================

/// Response time at which an answer earns full weight (seconds)
pub const DEFAULT_EXPECTED_TIME_SEC: f64 = 12.0;

/// Responses at or below this are treated as rapid (seconds)
pub const DEFAULT_RAPID_THRESHOLD_SEC: f64 = 5.0;

/// Weight reached at the rapid threshold
pub const DEFAULT_DOWN_WEIGHT_FACTOR: f64 = 0.5;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
