use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::TextScoringConfig;

/// Built-in positive emotion words.
pub const POSITIVE_WORDS: &[&str] = &[
    "happy", "excited", "great", "good", "excellent", "amazing", "wonderful",
    "fantastic", "love", "joy", "grateful", "thankful", "proud", "confident",
    "energized", "motivated", "hopeful", "peaceful", "calm", "relaxed", "better",
    "best", "glad", "cheerful", "optimistic",
];

/// Built-in negative emotion words. Disjoint from `POSITIVE_WORDS`.
pub const NEGATIVE_WORDS: &[&str] = &[
    "sad", "depressed", "anxious", "worried", "stressed", "upset", "angry",
    "frustrated", "tired", "exhausted", "overwhelmed", "bad", "terrible", "awful",
    "horrible", "worst", "hate", "lonely", "hopeless", "scared", "afraid",
    "nervous", "miserable", "hurt",
];

/// A whole-word negation marker, or an "n't" contraction. Runs on lower-cased text.
const NEGATION_MARKER: &str =
    r"\b(?:not|no|never|nothing|nobody|none|neither|nor|cannot)\b|n['’]t\b";

/// What has to come right after a marker for it to count.
const NEGATED_WORD: &str = r"^\s+[\w'’]+";

static MARKER: OnceLock<Regex> = OnceLock::new();
static FOLLOWER: OnceLock<Regex> = OnceLock::new();

fn marker_regex() -> &'static Regex {
    MARKER.get_or_init(|| Regex::new(NEGATION_MARKER).expect("negation marker is a valid regex"))
}

fn follower_regex() -> &'static Regex {
    FOLLOWER.get_or_init(|| Regex::new(NEGATED_WORD).expect("negated word is a valid regex"))
}

/// Word sets and pattern matchers used by the text scorer.
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().map(|w| w.to_string()).collect(),
            negative: NEGATIVE_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl Lexicon {
    /// Built-in word lists plus the `extra_positive`/`extra_negative` config entries.
    pub fn from_config(cfg: &TextScoringConfig) -> Self {
        let mut lexicon = Self::default();
        lexicon.extend(&cfg.extra_positive, &cfg.extra_negative);
        lexicon
    }

    pub fn extend<S: AsRef<str>>(&mut self, positive: &[S], negative: &[S]) {
        self.positive
            .extend(positive.iter().map(|w| w.as_ref().trim().to_lowercase()));
        self.negative
            .extend(negative.iter().map(|w| w.as_ref().trim().to_lowercase()));
    }

    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.contains(token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.contains(token)
    }

    /// Number of negation markers followed by a word. `text` must be lower-cased.
    ///
    /// Each marker is checked on its own, so in "not never happy" both "not"
    /// and "never" count.
    pub fn negation_matches(&self, text: &str) -> usize {
        marker_regex()
            .find_iter(text)
            .filter(|m| follower_regex().is_match(&text[m.end()..]))
            .count()
    }
}

/// Count of '!' characters.
pub fn exclamation_count(text: &str) -> usize {
    text.chars().filter(|&c| c == '!').count()
}

/// Count of '?' characters.
pub fn question_count(text: &str) -> usize {
    text.chars().filter(|&c| c == '?').count()
}

/// Split on whitespace, lower-case, and strip surrounding punctuation.
/// Tokens that are pure punctuation are dropped.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lists_are_disjoint() {
        for word in POSITIVE_WORDS {
            assert!(!NEGATIVE_WORDS.contains(word), "{word} is in both lists");
        }
    }

    #[test]
    fn lookups_are_exact() {
        let lex = Lexicon::default();
        assert!(lex.is_positive("happy"));
        assert!(lex.is_negative("sad"));
        assert!(!lex.is_positive("unhappy"));
    }

    #[test]
    fn extras_are_lowercased() {
        let mut lex = Lexicon::default();
        lex.extend(&["Stoked"], &["  Grumpy "]);
        assert!(lex.is_positive("stoked"));
        assert!(lex.is_negative("grumpy"));
    }

    #[test]
    fn tokenize_strips_punctuation() {
        let tokens: Vec<String> = tokenize("I am Happy and EXCITED! -- don't").collect();
        assert_eq!(tokens, vec!["i", "am", "happy", "and", "excited", "don't"]);
    }

    #[test]
    fn negation_markers() {
        let lex = Lexicon::default();
        assert_eq!(lex.negation_matches("i am not happy"), 1);
        assert_eq!(lex.negation_matches("i don't care and never cry"), 2);
        assert_eq!(lex.negation_matches("i can’t sleep"), 1);
    }

    #[test]
    fn chained_markers_each_count() {
        let lex = Lexicon::default();
        assert_eq!(lex.negation_matches("i am not never happy"), 2);
        assert_eq!(lex.negation_matches("no no no no sad"), 4);
        assert_eq!(lex.negation_matches("nothing nobody cares"), 2);
    }

    #[test]
    fn markers_need_a_following_word() {
        let lex = Lexicon::default();
        assert_eq!(lex.negation_matches("my notes say nothing"), 0);
        assert_eq!(lex.negation_matches("i said no."), 0);
        assert_eq!(lex.negation_matches("cannot stop"), 1);
    }

    #[test]
    fn negation_needs_a_following_word() {
        let lex = Lexicon::default();
        assert_eq!(lex.negation_matches("certainly not"), 0);
        assert_eq!(lex.negation_matches("notes and knots"), 0);
        assert_eq!(lex.negation_matches("i know that"), 0);
    }

    #[test]
    fn punctuation_counts() {
        assert_eq!(exclamation_count("wow!! ok!"), 3);
        assert_eq!(question_count("why? how??"), 3);
    }
}
