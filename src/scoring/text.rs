use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::lexicon::{self, Lexicon};
use super::MoodScore;
use crate::config::TextScoringConfig;
use crate::util;

/// Outcome of scoring one piece of journal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: MoodScore,
    /// Unrounded accumulated value, before clamping.
    pub raw: f64,
    pub positive_words: BTreeSet<String>,
    pub negative_words: BTreeSet<String>,
    pub negation_adjustments: usize,
    pub exclamation_adjustments: usize,
    pub question_penalty_applied: bool,
    pub indicators: TextIndicators,
}

/// Surface cues in the text, reported alongside the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextIndicators {
    pub has_questions: bool,
    pub has_exclamations: bool,
    /// Some word of three or more letters is written entirely in capitals.
    pub has_all_caps: bool,
    pub word_count: usize,
}

/// Lexicon-based text scorer.
///
/// Starts from a neutral baseline and nudges it per matched word, negation,
/// exclamation mark and (above a threshold) question marks. The adjustments
/// are additive: "not happy" earns both the positive word and the negation
/// penalty, so a negated positive word is dampened rather than inverted.
#[derive(Debug, Clone)]
pub struct TextScorer {
    lexicon: Lexicon,
    config: TextScoringConfig,
}

impl Default for TextScorer {
    fn default() -> Self {
        Self::new(&TextScoringConfig::default())
    }
}

impl TextScorer {
    pub fn new(config: &TextScoringConfig) -> Self {
        Self {
            lexicon: Lexicon::from_config(config),
            config: config.clone(),
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        let cfg = &self.config;
        let lowered = text.to_lowercase();

        let mut positive_hits = 0usize;
        let mut negative_hits = 0usize;
        let mut positive_words = BTreeSet::new();
        let mut negative_words = BTreeSet::new();
        let mut word_count = 0usize;

        for token in lexicon::tokenize(text) {
            word_count += 1;
            // A word listed on both sides gets both adjustments.
            if self.lexicon.is_positive(&token) {
                positive_hits += 1;
                positive_words.insert(token.clone());
            }
            if self.lexicon.is_negative(&token) {
                negative_hits += 1;
                negative_words.insert(token);
            }
        }

        let negations = self.lexicon.negation_matches(&lowered);
        let exclamations = lexicon::exclamation_count(text);
        let questions = lexicon::question_count(text);
        let question_penalty_applied = questions > cfg.question_threshold;

        let mut raw = cfg.baseline
            + positive_hits as f64 * cfg.word_weight
            - negative_hits as f64 * cfg.word_weight
            - negations as f64 * cfg.negation_penalty
            + exclamations as f64 * cfg.exclamation_bonus;
        if question_penalty_applied {
            raw -= cfg.question_penalty;
        }

        let score = MoodScore::from_f64(util::round_score(raw));

        tracing::debug!(
            raw,
            score = score.get(),
            positive_hits,
            negative_hits,
            negations,
            exclamations,
            "scored text"
        );

        SentimentResult {
            score,
            raw,
            positive_words,
            negative_words,
            negation_adjustments: negations,
            exclamation_adjustments: exclamations,
            question_penalty_applied,
            indicators: TextIndicators {
                has_questions: questions > 0,
                has_exclamations: exclamations > 0,
                has_all_caps: has_shouted_word(text),
                word_count,
            },
        }
    }
}

/// Score text with the built-in lexicon and default weights.
pub fn score_text(text: &str) -> SentimentResult {
    TextScorer::default().score(text)
}

fn has_shouted_word(text: &str) -> bool {
    text.split_whitespace().any(|raw| {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        word.chars().count() >= 3 && word.chars().all(|c| c.is_ascii_uppercase())
    })
}
