//! Item bank: JSON loading, validation, Likert selection per quiz mode
//!
//! Three documents make up a bank:
//! - `categories.json`     traits, categories and the category × trait weights
//! - `likert_items.json`   Likert statements plus the quick/standard forms
//! - `forced_choice_items.json`  scenarios comparing two categories
//!
//! Everything is checked once here. The records handed out afterwards are
//! validated and immutable, so the scoring code never re-checks them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::scoring::CategoryModel;
use crate::types::{
    CategoryPair, ForcedChoiceItem, ForcedChoiceOption, IrtParams, LikertItem, PairKey, QuizError,
    Timing,
};

pub const CATEGORIES_FILE: &str = "categories.json";
pub const LIKERT_FILE: &str = "likert_items.json";
pub const FORCED_CHOICE_FILE: &str = "forced_choice_items.json";

const BUILTIN_CATEGORIES: &str = include_str!("../../data/categories.json");
const BUILTIN_LIKERT: &str = include_str!("../../data/likert_items.json");
const BUILTIN_FORCED_CHOICE: &str = include_str!("../../data/forced_choice_items.json");

// =============================================================================
// QUIZ MODE
// =============================================================================

/// Quiz length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Quick,
    Standard,
    Thorough,
}

impl QuizMode {
    /// Tie-breaker round budget
    pub fn rounds(&self) -> u32 {
        match self {
            QuizMode::Quick => 1,
            QuizMode::Standard => 2,
            QuizMode::Thorough => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuizMode::Quick => "quick",
            QuizMode::Standard => "standard",
            QuizMode::Thorough => "thorough",
        }
    }
}

impl Default for QuizMode {
    fn default() -> Self {
        QuizMode::Standard
    }
}

impl std::fmt::Display for QuizMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// FILE SHAPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    traits: Vec<String>,
    #[serde(alias = "houses")]
    categories: Vec<String>,
    weights: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct LikertFile {
    items: Vec<RawLikertItem>,
    #[serde(default)]
    forms: Forms,
    timing: Option<Timing>,
}

#[derive(Debug, Default, Deserialize)]
struct Forms {
    #[serde(default)]
    quick: Vec<String>,
    #[serde(default)]
    standard: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawLikertItem {
    id: String,
    text: String,
    trait_weights: BTreeMap<String, f64>,
    irt: IrtParams,
    timing: Option<Timing>,
}

#[derive(Debug, Deserialize)]
struct ForcedChoiceFile {
    items: Vec<RawForcedChoiceItem>,
    timing: Option<Timing>,
}

#[derive(Debug, Deserialize)]
struct RawForcedChoiceItem {
    id: String,
    #[serde(alias = "house_pair")]
    category_pair: Vec<String>,
    stem: String,
    options: Vec<ForcedChoiceOption>,
    timing: Option<Timing>,
}

// =============================================================================
// ITEM BANK
// =============================================================================

/// Validated items and category model
#[derive(Debug, Clone)]
pub struct ItemBank {
    model: Arc<CategoryModel>,
    likert_items: Vec<LikertItem>,
    likert_index: HashMap<String, usize>,
    quick_form: Vec<String>,
    standard_form: Vec<String>,
    forced_choice_items: Vec<ForcedChoiceItem>,
}

impl ItemBank {
    /// Sample bank compiled into the crate
    pub fn builtin() -> Result<Self, QuizError> {
        Self::from_json_strs(BUILTIN_CATEGORIES, BUILTIN_LIKERT, BUILTIN_FORCED_CHOICE)
    }

    /// Load the three bank documents from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, QuizError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|source| QuizError::BankIo {
                path: path.display().to_string(),
                source,
            })
        };

        let categories = read(CATEGORIES_FILE)?;
        let likert = read(LIKERT_FILE)?;
        let forced_choice = read(FORCED_CHOICE_FILE)?;

        let bank = Self::from_json_strs(&categories, &likert, &forced_choice)?;
        info!(dir = %dir.display(), "item bank loaded");
        Ok(bank)
    }

    /// Parse and validate the three bank documents
    pub fn from_json_strs(categories: &str, likert: &str, forced_choice: &str) -> Result<Self, QuizError> {
        let categories: CategoriesFile = parse(CATEGORIES_FILE, categories)?;
        let likert: LikertFile = parse(LIKERT_FILE, likert)?;
        let forced_choice: ForcedChoiceFile = parse(FORCED_CHOICE_FILE, forced_choice)?;

        let model = CategoryModel::new(categories.traits, categories.categories, &categories.weights)?;

        // Likert items: item timing, else file timing, else defaults
        let likert_timing = match likert.timing {
            Some(t) => {
                validate_timing(&t, LIKERT_FILE)?;
                t
            }
            None => Timing::default(),
        };

        let mut likert_items = Vec::with_capacity(likert.items.len());
        let mut likert_index = HashMap::with_capacity(likert.items.len());
        for raw in likert.items {
            let item = validate_likert(raw, likert_timing, &model)?;
            if likert_index.insert(item.id.clone(), likert_items.len()).is_some() {
                return Err(QuizError::DuplicateItemId { kind: "likert", id: item.id });
            }
            likert_items.push(item);
        }

        let quick_form = validate_form("quick", likert.forms.quick, &likert_index)?;
        let standard_form = validate_form("standard", likert.forms.standard, &likert_index)?;

        // Forced-choice items fall back to the Likert file timing
        let fc_timing = match forced_choice.timing {
            Some(t) => {
                validate_timing(&t, FORCED_CHOICE_FILE)?;
                t
            }
            None => likert_timing,
        };

        let mut forced_choice_items = Vec::with_capacity(forced_choice.items.len());
        let mut fc_ids = HashSet::with_capacity(forced_choice.items.len());
        for raw in forced_choice.items {
            let item = validate_forced_choice(raw, fc_timing, &model)?;
            if !fc_ids.insert(item.id.clone()) {
                return Err(QuizError::DuplicateItemId { kind: "forced-choice", id: item.id });
            }
            forced_choice_items.push(item);
        }

        let bank = Self {
            model: Arc::new(model),
            likert_items,
            likert_index,
            quick_form,
            standard_form,
            forced_choice_items,
        };
        bank.warn_on_gaps();
        Ok(bank)
    }

    /// Gaps that are legal but will hurt a session
    fn warn_on_gaps(&self) {
        for (form, ids) in [("quick", &self.quick_form), ("standard", &self.standard_form)] {
            if ids.is_empty() {
                warn!(form, "likert form is empty; that mode asks no likert questions");
            }
        }
        let covered: HashSet<PairKey> = self
            .forced_choice_items
            .iter()
            .map(|i| i.category_pair.canonical_key())
            .collect();
        for pair in CategoryPair::all_pairs(self.model.categories()) {
            if !covered.contains(&pair.canonical_key()) {
                warn!(pair = %pair, "no forced-choice items for pair; a tie on it cannot be broken");
            }
        }
    }

    pub fn model(&self) -> Arc<CategoryModel> {
        Arc::clone(&self.model)
    }

    pub fn categories(&self) -> &[String] {
        self.model.categories()
    }

    pub fn traits(&self) -> &[String] {
        self.model.traits()
    }

    pub fn likert_items(&self) -> &[LikertItem] {
        &self.likert_items
    }

    pub fn likert_item(&self, id: &str) -> Option<&LikertItem> {
        self.likert_index.get(id).map(|&i| &self.likert_items[i])
    }

    pub fn forced_choice_items(&self) -> &[ForcedChoiceItem] {
        &self.forced_choice_items
    }

    fn form_ids(&self, mode: QuizMode) -> Option<&[String]> {
        match mode {
            QuizMode::Quick => Some(&self.quick_form),
            QuizMode::Standard => Some(&self.standard_form),
            QuizMode::Thorough => None,
        }
    }

    /// Number of Likert questions a mode asks
    pub fn likert_count(&self, mode: QuizMode) -> usize {
        self.form_ids(mode).map(|ids| ids.len()).unwrap_or(self.likert_items.len())
    }

    /// Likert items for a mode, shuffled
    pub fn select_likert_items<R: Rng + ?Sized>(&self, mode: QuizMode, rng: &mut R) -> Vec<LikertItem> {
        let mut out: Vec<LikertItem> = match self.form_ids(mode) {
            Some(ids) => ids.iter().filter_map(|id| self.likert_item(id).cloned()).collect(),
            None => self.likert_items.clone(),
        };
        out.shuffle(rng);
        out
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

fn parse<T: serde::de::DeserializeOwned>(document: &str, text: &str) -> Result<T, QuizError> {
    serde_json::from_str(text).map_err(|source| QuizError::BankParse {
        document: document.to_string(),
        source,
    })
}

fn validate_timing(t: &Timing, owner: &str) -> Result<(), QuizError> {
    let finite = t.expected_time_sec.is_finite()
        && t.rapid_threshold_sec.is_finite()
        && t.down_weight_factor.is_finite();
    if !finite {
        return Err(QuizError::InvalidTiming(format!("{}: timing values must be finite", owner)));
    }
    if !(t.rapid_threshold_sec > 0.0 && t.rapid_threshold_sec < t.expected_time_sec) {
        return Err(QuizError::InvalidTiming(format!(
            "{}: need 0 < rapid_threshold_sec ({}) < expected_time_sec ({})",
            owner, t.rapid_threshold_sec, t.expected_time_sec
        )));
    }
    if !(t.down_weight_factor > 0.0 && t.down_weight_factor < 1.0) {
        return Err(QuizError::InvalidTiming(format!(
            "{}: down_weight_factor {} outside (0, 1)",
            owner, t.down_weight_factor
        )));
    }
    Ok(())
}

fn validate_likert(raw: RawLikertItem, file_timing: Timing, model: &CategoryModel) -> Result<LikertItem, QuizError> {
    let id = raw.id.trim().to_string();
    if id.is_empty() {
        return Err(QuizError::BlankId("likert"));
    }

    for (trait_name, weight) in &raw.trait_weights {
        if model.trait_index(trait_name).is_none() {
            return Err(QuizError::UnknownTrait {
                item_id: id,
                name: trait_name.clone(),
            });
        }
        if !weight.is_finite() {
            return Err(QuizError::InvalidItem {
                item_id: id,
                detail: format!("trait weight for '{}' is not finite", trait_name),
            });
        }
    }

    if !raw.irt.a.is_finite() {
        return Err(QuizError::InvalidItem {
            item_id: id,
            detail: "discrimination is not finite".to_string(),
        });
    }
    if !raw.irt.thresholds.is_finite() || !raw.irt.thresholds.is_ordered() {
        return Err(QuizError::InvalidThresholds(id));
    }

    let timing = match raw.timing {
        Some(t) => {
            validate_timing(&t, &id)?;
            t
        }
        None => file_timing,
    };

    Ok(LikertItem {
        id,
        text: raw.text,
        trait_weights: raw.trait_weights,
        irt: raw.irt,
        timing,
    })
}

fn validate_form(
    form: &'static str,
    ids: Vec<String>,
    index: &HashMap<String, usize>,
) -> Result<Vec<String>, QuizError> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim().to_string();
        if !index.contains_key(&id) {
            return Err(QuizError::UnknownFormItem { form, id });
        }
        if out.contains(&id) {
            return Err(QuizError::DuplicateItemId { kind: form, id });
        }
        out.push(id);
    }
    Ok(out)
}

fn validate_forced_choice(
    raw: RawForcedChoiceItem,
    file_timing: Timing,
    model: &CategoryModel,
) -> Result<ForcedChoiceItem, QuizError> {
    let id = raw.id.trim().to_string();
    if id.is_empty() {
        return Err(QuizError::BlankId("forced-choice"));
    }
    let invalid = |detail: String| QuizError::InvalidItem { item_id: id.clone(), detail };

    let [first, second]: [String; 2] = raw
        .category_pair
        .try_into()
        .map_err(|v: Vec<String>| invalid(format!("category pair has {} entries, expected 2", v.len())))?;
    for category in [&first, &second] {
        if model.category_index(category).is_none() {
            return Err(QuizError::UnknownCategory(category.clone()));
        }
    }
    if first == second {
        return Err(invalid(format!("category pair repeats '{}'", first)));
    }
    let pair = CategoryPair::new(first, second);

    let mut options: [ForcedChoiceOption; 2] = raw
        .options
        .try_into()
        .map_err(|v: Vec<ForcedChoiceOption>| invalid(format!("{} options, expected 2", v.len())))?;
    for option in &mut options {
        option.key = option.key.trim().to_string();
        if option.key.is_empty() {
            return Err(invalid("option with a blank key".to_string()));
        }
    }
    if options[0].key.eq_ignore_ascii_case(&options[1].key) {
        return Err(invalid(format!("option keys '{}' collide", options[0].key)));
    }
    let option_pair = CategoryPair::new(options[0].category.clone(), options[1].category.clone());
    if option_pair != pair || options[0].category == options[1].category {
        return Err(invalid(format!(
            "options cover {} but the item compares {}",
            option_pair, pair
        )));
    }

    let timing = match raw.timing {
        Some(t) => {
            validate_timing(&t, &id)?;
            t
        }
        None => file_timing,
    };

    Ok(ForcedChoiceItem {
        id,
        category_pair: pair,
        stem: raw.stem,
        options,
        timing,
    })
}

// =============================================================================
// TESTS
// =============================================================================
