//! Conflict-domain override.
//!
//! Geopolitical conflict coverage is rarely good news even when individual
//! words score positive ("ceasefire talks collapse as strikes continue").
//! When the text mentions a conflict keyword, the already-computed dual
//! totals are rescaled: positive to 30%, negative up by 20%.
//!
//! Kept separate from the base scorer so callers can switch it off or tune
//! the factors without touching the lexicon engine.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sentiment::{prepare, word_pattern, Scores};

const CONFLICT_KEYWORDS: &[&str] = &[
    "war", "wars", "attack", "attacks", "attacked", "strike", "strikes", "airstrike",
    "airstrikes", "kill", "kills", "killed", "killing", "bomb", "bombs", "bombed", "bombing",
    "missile", "missiles", "conflict", "violence", "death", "deaths", "casualty",
    "casualties", "wounded", "destroy", "destroyed", "destruction", "fight", "fighting",
    "battle", "battles", "invasion", "invade", "invaded", "terror", "terrorism", "terrorist",
    "terrorists",
];

static CONFLICT: Lazy<Regex> = Lazy::new(|| word_pattern(CONFLICT_KEYWORDS));

fn default_positive_factor() -> f64 {
    0.3
}
fn default_negative_factor() -> f64 {
    1.2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictOverride {
    #[serde(default = "default_positive_factor")]
    pub positive_factor: f64,
    #[serde(default = "default_negative_factor")]
    pub negative_factor: f64,
}

impl Default for ConflictOverride {
    fn default() -> Self {
        Self {
            positive_factor: default_positive_factor(),
            negative_factor: default_negative_factor(),
        }
    }
}

impl ConflictOverride {
    /// True if the (truncated, lower-cased) text mentions a conflict keyword.
    pub fn detect(text: &str) -> bool {
        CONFLICT.is_match(&prepare(text))
    }

    /// Rescale `scores` when `text` is conflict coverage; otherwise return
    /// them untouched. Temporal flags are carried through unchanged.
    pub fn apply(&self, text: &str, scores: Scores) -> Scores {
        if !Self::detect(text) {
            return scores;
        }
        Scores {
            positive: scores.positive * self.positive_factor,
            negative: scores.negative * self.negative_factor,
            ..scores
        }
    }
}
