//! Error type for the scoring engine and item bank

use thiserror::Error;

/// Errors raised by the engine, the item bank and the quiz flow
///
/// Everything except `OutOfPhase` means the loaded item bank does not match
/// what the engine expects; callers should surface it and abort the session.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("E101_UNKNOWN_TRAIT: item '{item_id}' references unknown trait '{name}'")]
    UnknownTrait { item_id: String, name: String },

    #[error("E102_UNKNOWN_CATEGORY: unknown category '{0}'")]
    UnknownCategory(String),

    #[error("E103_UNKNOWN_OPTION_KEY: item '{item_id}' has no option '{key}'")]
    UnknownOptionKey { item_id: String, key: String },

    #[error("E104_NO_ITEMS_FOR_PAIR: no forced-choice items for pair {0}")]
    NoItemsForPair(String),

    #[error("E201_DUPLICATE_ID: duplicate {kind} item id '{id}'")]
    DuplicateItemId { kind: &'static str, id: String },

    #[error("E202_BLANK_ID: {0} item has a blank id")]
    BlankId(&'static str),

    #[error("E203_INVALID_THRESHOLDS: item '{0}' thresholds must be finite with b1 <= b2 <= b3 <= b4")]
    InvalidThresholds(String),

    #[error("E204_INVALID_TIMING: {0}")]
    InvalidTiming(String),

    #[error("E205_INVALID_ITEM: item '{item_id}': {detail}")]
    InvalidItem { item_id: String, detail: String },

    #[error("E206_INVALID_WEIGHTS: {0}")]
    InvalidWeights(String),

    #[error("E207_UNKNOWN_FORM_ITEM: form '{form}' references unknown item '{id}'")]
    UnknownFormItem { form: &'static str, id: String },

    #[error("E301_BANK_IO: {path}: {source}")]
    BankIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("E302_BANK_PARSE: {document}: {source}")]
    BankParse {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("E401_OUT_OF_PHASE: {0}")]
    OutOfPhase(String),
}

impl QuizError {
    /// Stable reason code (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownTrait { .. } => "E101_UNKNOWN_TRAIT",
            Self::UnknownCategory(_) => "E102_UNKNOWN_CATEGORY",
            Self::UnknownOptionKey { .. } => "E103_UNKNOWN_OPTION_KEY",
            Self::NoItemsForPair(_) => "E104_NO_ITEMS_FOR_PAIR",
            Self::DuplicateItemId { .. } => "E201_DUPLICATE_ID",
            Self::BlankId(_) => "E202_BLANK_ID",
            Self::InvalidThresholds(_) => "E203_INVALID_THRESHOLDS",
            Self::InvalidTiming(_) => "E204_INVALID_TIMING",
            Self::InvalidItem { .. } => "E205_INVALID_ITEM",
            Self::InvalidWeights(_) => "E206_INVALID_WEIGHTS",
            Self::UnknownFormItem { .. } => "E207_UNKNOWN_FORM_ITEM",
            Self::BankIo { .. } => "E301_BANK_IO",
            Self::BankParse { .. } => "E302_BANK_PARSE",
            Self::OutOfPhase(_) => "E401_OUT_OF_PHASE",
        }
    }

    /// Configuration/data mismatch, as opposed to a call made at the wrong time
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::OutOfPhase(_))
    }
}
