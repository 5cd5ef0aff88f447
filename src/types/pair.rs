//! Unordered category pair used by forced-choice rounds

use serde::{Deserialize, Serialize};

/// Two categories compared by a forced-choice item
///
/// Order is kept for display (first = left option), but equality and the
/// rotation key treat the pair as unordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPair {
    pub first: String,
    pub second: String,
}

impl CategoryPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Order-independent key, (a, b) with a ≤ b
    pub fn canonical_key(&self) -> PairKey {
        canonical_pair_key(&self.first, &self.second)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.first == category || self.second == category
    }

    /// The category opposite `category`, or None if it is not in the pair
    pub fn other(&self, category: &str) -> Option<&str> {
        if self.first == category {
            Some(&self.second)
        } else if self.second == category {
            Some(&self.first)
        } else {
            None
        }
    }

    /// All unordered pairs of a list, in enumeration order (0,1), (0,2) … (1,2) …
    pub fn all_pairs(categories: &[String]) -> Vec<CategoryPair> {
        let mut out = Vec::new();
        for (i, a) in categories.iter().enumerate() {
            for b in &categories[i + 1..] {
                out.push(CategoryPair::new(a.clone(), b.clone()));
            }
        }
        out
    }
}

impl PartialEq for CategoryPair {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for CategoryPair {}

impl std::fmt::Display for CategoryPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {}", self.first, self.second)
    }
}

/// Sorted category names identifying an unordered pair
pub type PairKey = (String, String);

/// Order-independent key for two category names
pub fn canonical_pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
