//! Forced-choice item rotation
//!
//! Items are grouped by unordered category pair. Each group is shuffled once
//! up front and served in order; when a group runs out it is reshuffled and
//! served again. No repeats inside a cycle, but the last item of one cycle
//! may come up first in the next.

use std::collections::HashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::types::{canonical_pair_key, ForcedChoiceItem, PairKey, QuizError};

#[derive(Debug, Clone)]
struct Deck {
    items: Vec<ForcedChoiceItem>,
    next: usize,
    reshuffles: u32,
}

/// Per-pair decks of forced-choice items
#[derive(Debug, Clone)]
pub struct ForcedChoiceRotation {
    decks: HashMap<PairKey, Deck>,
    rng: StdRng,
}

impl ForcedChoiceRotation {
    pub fn new(items: &[ForcedChoiceItem], mut rng: StdRng) -> Self {
        let mut decks: HashMap<PairKey, Deck> = HashMap::new();
        for item in items {
            decks
                .entry(item.category_pair.canonical_key())
                .or_insert_with(|| Deck { items: Vec::new(), next: 0, reshuffles: 0 })
                .items
                .push(item.clone());
        }

        // Sort keys so a seeded rng gives the same shuffles every run
        let mut keys: Vec<PairKey> = decks.keys().cloned().collect();
        keys.sort();
        for key in keys {
            if let Some(deck) = decks.get_mut(&key) {
                deck.items.shuffle(&mut rng);
            }
        }

        Self { decks, rng }
    }

    /// Next item for the unordered pair (a, b)
    pub fn next_item(&mut self, a: &str, b: &str) -> Result<ForcedChoiceItem, QuizError> {
        let key = canonical_pair_key(a, b);
        let deck = match self.decks.get_mut(&key) {
            Some(deck) if !deck.items.is_empty() => deck,
            _ => return Err(QuizError::NoItemsForPair(format!("{} vs {}", key.0, key.1))),
        };

        if deck.next >= deck.items.len() {
            deck.items.shuffle(&mut self.rng);
            deck.next = 0;
            deck.reshuffles += 1;
            debug!(first = %key.0, second = %key.1, reshuffles = deck.reshuffles, "forced-choice deck reshuffled");
        }

        let item = deck.items[deck.next].clone();
        deck.next += 1;
        Ok(item)
    }

    /// Number of items available for a pair
    pub fn deck_size(&self, a: &str, b: &str) -> usize {
        self.decks
            .get(&canonical_pair_key(a, b))
            .map(|d| d.items.len())
            .unwrap_or(0)
    }

    /// Times the pair's deck has been reshuffled after running out
    pub fn reshuffles(&self, a: &str, b: &str) -> u32 {
        self.decks
            .get(&canonical_pair_key(a, b))
            .map(|d| d.reshuffles)
            .unwrap_or(0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
