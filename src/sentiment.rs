//! # Sentiment Classifier
//! Rule-based polarity scoring for news text: weighted lexicon matching,
//! sentence-level negation dampening, temporal-context weighting and a
//! sentence-position weight that favours concluding sentences.
//!
//! Pure and deterministic. The lexicon is parsed once from
//! `sentiment_lexicon.json` into read-only tables shared by every caller.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::conflict::ConflictOverride;

/// Inputs are clipped (not summarized) to this many characters.
pub const MAX_INPUT_CHARS: usize = 512;

pub const NEUTRAL_LOW_SIGNAL_CONFIDENCE: f64 = 0.7;
pub const NEUTRAL_TIE_CONFIDENCE: f64 = 0.6;
pub const MAX_CONFIDENCE: f64 = 0.95;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "without", "cannot", "can't", "won't",
    "didn't", "doesn't", "isn't",
];

const PAST_MARKERS: &[&str] = &[
    "was", "were", "had", "did", "used to", "previously", "formerly", "once", "earlier",
    "before", "ago", "last", "yesterday", "historical", "history",
];

const PRESENT_FUTURE_MARKERS: &[&str] = &[
    "is", "are", "am", "being", "has", "have", "now", "today", "currently", "present",
    "ongoing", "will", "shall", "going to", "future", "soon", "tomorrow", "upcoming",
];

const PAST_WEIGHT: f64 = 0.7;
const PRESENT_FUTURE_WEIGHT: f64 = 1.3;
const NEGATION_DAMPING: f64 = 0.8;
const MIXED_TIMELINE_BOOST: f64 = 1.2;
const MIN_SIGNAL: f64 = 0.5;
const DOMINANCE_RATIO: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => anyhow::bail!("unknown sentiment label: {other}"),
        }
    }
}

/// Classifier output. Polar labels carry confidence in `[0.5, 0.95]`;
/// neutral is always 0.6 (tie) or 0.7 (too little signal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl SentimentResult {
    fn neutral(confidence: f64) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            confidence,
        }
    }
}

struct LexiconEntry {
    #[cfg_attr(not(test), allow(dead_code))]
    term: String,
    weight: f64,
    pattern: Regex,
}

struct Lexicon {
    positive: Vec<LexiconEntry>,
    negative: Vec<LexiconEntry>,
}

#[derive(Deserialize)]
struct RawLexicon {
    positive: BTreeMap<String, f64>,
    negative: BTreeMap<String, f64>,
}

// BTreeMap keeps summation order stable across processes.
static LEXICON: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    let parsed: RawLexicon = serde_json::from_str(raw).expect("valid sentiment lexicon");
    Lexicon {
        positive: compile_entries(parsed.positive),
        negative: compile_entries(parsed.negative),
    }
});

static NEGATION: Lazy<Regex> = Lazy::new(|| word_pattern(NEGATION_WORDS));
static PAST: Lazy<Regex> = Lazy::new(|| word_pattern(PAST_MARKERS));
static PRESENT_FUTURE: Lazy<Regex> = Lazy::new(|| word_pattern(PRESENT_FUTURE_MARKERS));
static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence regex"));

fn compile_entries(terms: BTreeMap<String, f64>) -> Vec<LexiconEntry> {
    terms
        .into_iter()
        .map(|(term, weight)| {
            let term = term.trim().to_lowercase();
            let pattern = word_pattern(&[term.as_str()]);
            LexiconEntry {
                term,
                weight,
                pattern,
            }
        })
        .collect()
}

/// Whole-word (or whole-phrase) alternation over `words`.
pub(crate) fn word_pattern(words: &[&str]) -> Regex {
    let alts = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alts})\b")).expect("word-boundary pattern")
}

/// Truncate to `MAX_INPUT_CHARS`, then lower-case.
pub(crate) fn prepare(text: &str) -> String {
    text.chars()
        .take(MAX_INPUT_CHARS)
        .collect::<String>()
        .to_lowercase()
}

/// Running polarity totals plus the temporal flags OR'd over all sentences.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scores {
    pub positive: f64,
    pub negative: f64,
    pub has_past_context: bool,
    pub has_present_future_context: bool,
}

impl Scores {
    pub fn total(&self) -> f64 {
        self.positive + self.negative
    }

    /// Map the totals to a label. Polarity must lead by more than 20%
    /// to win; closer races are reported as neutral.
    pub fn classify(&self) -> SentimentResult {
        let total = self.total();
        if total < MIN_SIGNAL {
            return SentimentResult::neutral(NEUTRAL_LOW_SIGNAL_CONFIDENCE);
        }
        if self.positive > self.negative * DOMINANCE_RATIO {
            SentimentResult {
                label: SentimentLabel::Positive,
                confidence: (0.5 + self.positive / (total * 2.0)).min(MAX_CONFIDENCE),
            }
        } else if self.negative > self.positive * DOMINANCE_RATIO {
            SentimentResult {
                label: SentimentLabel::Negative,
                confidence: (0.5 + self.negative / (total * 2.0)).min(MAX_CONFIDENCE),
            }
        } else {
            SentimentResult::neutral(NEUTRAL_TIE_CONFIDENCE)
        }
    }
}

/// Base lexicon scoring, including the mixed-timeline post-pass.
pub fn score(text: &str) -> Scores {
    let lowered = prepare(text);
    let sentences: Vec<&str> = SENTENCE_SPLIT
        .split(&lowered)
        .filter(|s| !s.trim().is_empty())
        .collect();
    let count = sentences.len() as f64;

    let mut scores = Scores::default();
    for (i, sentence) in sentences.iter().enumerate() {
        let is_past = PAST.is_match(sentence);
        let is_present_future = PRESENT_FUTURE.is_match(sentence);
        scores.has_past_context |= is_past;
        scores.has_present_future_context |= is_present_future;

        // present/future wins when a sentence carries both kinds of marker
        let temporal_weight = if is_present_future {
            PRESENT_FUTURE_WEIGHT
        } else if is_past {
            PAST_WEIGHT
        } else {
            1.0
        };
        let position_weight = 0.8 + 0.4 * (i as f64 / count);
        let multiplier = temporal_weight * position_weight;
        let negated = NEGATION.is_match(sentence);

        for entry in &LEXICON.positive {
            let hits = entry.pattern.find_iter(sentence).count();
            if hits == 0 {
                continue;
            }
            let contribution = hits as f64 * entry.weight * multiplier;
            if negated {
                scores.negative += contribution * NEGATION_DAMPING;
            } else {
                scores.positive += contribution;
            }
        }

        for entry in &LEXICON.negative {
            let hits = entry.pattern.find_iter(sentence).count();
            if hits == 0 {
                continue;
            }
            let contribution = hits as f64 * entry.weight * multiplier;
            if negated {
                scores.positive += contribution * NEGATION_DAMPING;
            } else {
                scores.negative += contribution;
            }
        }
    }

    // "Overcame adversity" narratives: past trouble, present resolution.
    if scores.has_past_context
        && scores.has_present_future_context
        && scores.positive > 0.0
        && scores.negative > 0.0
    {
        scores.positive *= MIXED_TIMELINE_BOOST;
    }

    scores
}

/// Classify `text` with the base scorer only. Never fails; empty input is
/// neutral with low information.
pub fn classify(text: &str) -> SentimentResult {
    score(text).classify()
}

/// Classifier handle with an optional conflict-domain adjustment layer.
#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer {
    conflict: Option<ConflictOverride>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflict_override(mut self, conflict: ConflictOverride) -> Self {
        self.conflict = Some(conflict);
        self
    }

    pub fn classify(&self, text: &str) -> SentimentResult {
        let scores = score(text);
        let scores = match &self.conflict {
            Some(conflict) => conflict.apply(text, scores),
            None => scores,
        };
        scores.classify()
    }
}
