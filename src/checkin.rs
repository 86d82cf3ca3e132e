//! One check-in from submission to stored entry.
//!
//! Scores whichever modalities were supplied, merges them when both are
//! present, appends the entry, then re-reads the recent history to decide
//! whether a supportive prompt is due.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::error::ScoringError;
use crate::intervention::{self, SupportPrompt};
use crate::scoring::aggregate::{self, CombinedResult};
use crate::scoring::text::{SentimentResult, TextScorer};
use crate::scoring::trend::{self, InterventionDecision};
use crate::scoring::voice::{self, VoiceAnalysis, VoiceFeatures};
use crate::scoring::MoodScore;
use crate::storage::{MoodEntry, MoodRepository, NewMoodEntry, RawFeatures, Source};
use crate::util;

/// Longest journal excerpt kept on an entry, in characters.
pub const NOTE_MAX_CHARS: usize = 200;

/// What the user submitted.
#[derive(Debug, Clone)]
pub struct CheckIn {
    pub user: String,
    pub text: Option<String>,
    /// A recording was supplied; `None` inside means it yielded no features.
    pub voice: Option<Option<VoiceFeatures>>,
    pub timestamp: DateTime<Utc>,
}

/// Scores for a check-in, ready to store.
#[derive(Debug, Clone)]
pub struct ScoredCheckIn {
    pub sentiment: Option<SentimentResult>,
    pub voice: Option<VoiceAnalysis>,
    pub combined: Option<CombinedResult>,
    pub entry: NewMoodEntry,
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub scored: ScoredCheckIn,
    pub stored: MoodEntry,
    pub decision: InterventionDecision,
    pub prompt: Option<SupportPrompt>,
}

/// Score a check-in without touching storage.
pub fn score(checkin: &CheckIn, cfg: &AppConfig) -> Result<ScoredCheckIn, ScoringError> {
    let text = checkin.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let sentiment = text.map(|t| TextScorer::new(&cfg.text).score(t));

    let voice = match &checkin.voice {
        Some(features) => Some(
            voice::score_voice(features.as_ref(), &cfg.voice).ok_or(ScoringError::MissingFeatures)?,
        ),
        None => None,
    };

    let note = text.map(excerpt);

    let (mood_score, source, raw_features, combined) = match (&sentiment, &voice) {
        (Some(s), Some(v)) => {
            let result = aggregate::combine_with_confidence(
                s.score.as_f64(),
                v.score.as_f64(),
                v.confidence,
                &cfg.aggregator,
            )?;
            let features = voice_features(checkin)?;
            let raw = RawFeatures::Combined {
                text_score: result.text_score,
                voice_score: result.voice_score,
                final_score: result.final_score,
                discrepancy: result.discrepancy.level,
                features,
                clarity: v.clarity,
                voice_confidence: v.confidence,
            };
            let score = MoodScore::from_f64(util::round_score(result.final_score));
            (score, Source::Combined, raw, Some(result))
        }
        (Some(s), None) => {
            let raw = RawFeatures::Text {
                positive_words: s.positive_words.iter().cloned().collect(),
                negative_words: s.negative_words.iter().cloned().collect(),
                negations: s.negation_adjustments,
                exclamations: s.exclamation_adjustments,
            };
            (s.score, Source::Text, raw, None)
        }
        (None, Some(v)) => {
            let raw = RawFeatures::Voice {
                features: voice_features(checkin)?,
                clarity: v.clarity,
            };
            (v.score, Source::Voice, raw, None)
        }
        (None, None) => return Err(ScoringError::EmptyCheckIn),
    };

    Ok(ScoredCheckIn {
        sentiment,
        voice,
        combined,
        entry: NewMoodEntry {
            user: checkin.user.clone(),
            timestamp: checkin.timestamp,
            mood_score,
            source,
            raw_features: Some(raw_features),
            note,
        },
    })
}

/// Score, store, and evaluate the intervention signal for one check-in.
pub fn record<R: MoodRepository + ?Sized>(
    repo: &mut R,
    checkin: &CheckIn,
    cfg: &AppConfig,
) -> Result<CheckInOutcome> {
    let scored = score(checkin, cfg)?;
    let stored = repo.append(scored.entry.clone())?;

    let icfg = &cfg.intervention;
    let recent = repo.history(&checkin.user, Some(icfg.window_size.max(icfg.min_entries)))?;
    let decision = trend::intervention_check(&recent, icfg);
    let last_dismissal = repo.last_dismissal(&checkin.user)?;
    let prompt = intervention::prompt_for(&decision, last_dismissal, checkin.timestamp, icfg);

    Ok(CheckInOutcome {
        scored,
        stored,
        decision,
        prompt,
    })
}

fn voice_features(checkin: &CheckIn) -> Result<VoiceFeatures, ScoringError> {
    checkin.voice.flatten().ok_or(ScoringError::MissingFeatures)
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(NOTE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
