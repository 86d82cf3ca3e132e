use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{InterventionConfig, TrendConfig};
use crate::error::ScoringError;
use crate::storage::entry::MoodEntry;
use crate::util;

/// Every function in this module expects history oldest-first.
/// Use `chronological` to convert data that arrives newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrder {
    OldestFirst,
    NewestFirst,
}

/// Put a history into the oldest-first order the evaluators expect.
pub fn chronological(mut entries: Vec<MoodEntry>, order: HistoryOrder) -> Vec<MoodEntry> {
    if order == HistoryOrder::NewestFirst {
        entries.reverse();
    }
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    Stable,
    Fluctuating,
    Negative,
}

impl std::fmt::Display for TrendClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendClass::Stable => write!(f, "stable"),
            TrendClass::Fluctuating => write!(f, "fluctuating"),
            TrendClass::Negative => write!(f, "negative"),
        }
    }
}

/// Movement between the oldest and newest entries of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Steady,
    Insufficient,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Declining => write!(f, "declining"),
            TrendDirection::Steady => write!(f, "steady"),
            TrendDirection::Insufficient => write!(f, "not enough data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendStatus {
    pub classification: TrendClass,
    /// Window mean rounded to one decimal. None for an empty history.
    pub average_score: Option<f64>,
    /// Number of entries actually considered.
    pub window_size: usize,
    pub message: Option<String>,
    pub direction: TrendDirection,
}

/// Classify the most recent `window_size` entries of an oldest-first history.
pub fn evaluate_trend(
    history: &[MoodEntry],
    window_size: usize,
    cfg: &TrendConfig,
) -> Result<TrendStatus, ScoringError> {
    if window_size == 0 {
        return Err(ScoringError::config("trend window size must be positive"));
    }

    let window = recent_scores(history, window_size);
    let Some(mean) = util::mean(&window) else {
        return Ok(TrendStatus {
            classification: TrendClass::Stable,
            average_score: None,
            window_size: 0,
            message: Some("No mood entries yet; keep journaling to see a trend.".into()),
            direction: TrendDirection::Insufficient,
        });
    };

    let classification = if mean >= cfg.stable_min {
        TrendClass::Stable
    } else if mean >= cfg.negative_below {
        TrendClass::Fluctuating
    } else {
        TrendClass::Negative
    };

    Ok(TrendStatus {
        classification,
        average_score: Some(util::round_to(mean, 1)),
        window_size: window.len(),
        message: None,
        direction: direction(&window, cfg),
    })
}

fn direction(window: &[f64], cfg: &TrendConfig) -> TrendDirection {
    if window.len() < 2 {
        return TrendDirection::Insufficient;
    }
    let span = cfg.direction_span.clamp(1, window.len());
    let (Some(early), Some(recent)) = (
        util::mean(&window[..span]),
        util::mean(&window[window.len() - span..]),
    ) else {
        return TrendDirection::Insufficient;
    };

    if recent > early + cfg.direction_delta {
        TrendDirection::Improving
    } else if recent < early - cfg.direction_delta {
        TrendDirection::Declining
    } else {
        TrendDirection::Steady
    }
}

/// Sample standard deviation that maps to full volatility.
pub const VOLATILITY_SCALE: f64 = 4.5;

/// Spread of a set of scores in [0, 1]: sample standard deviation over
/// `VOLATILITY_SCALE`, capped at 1. Zero with fewer than two scores.
pub fn volatility(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }
    let Some(mean) = util::mean(scores) else {
        return 0.0;
    };
    let variance =
        scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (scores.len() - 1) as f64;
    (variance.sqrt() / VOLATILITY_SCALE).min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowReason {
    NoEntries,
    HighVolatility,
    FrequentEntries,
    Default,
}

impl std::fmt::Display for WindowReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowReason::NoEntries => write!(f, "no entries yet"),
            WindowReason::HighVolatility => write!(f, "high volatility detected"),
            WindowReason::FrequentEntries => write!(f, "frequent entries"),
            WindowReason::Default => write!(f, "default window"),
        }
    }
}

/// How many days of history to look at, and why.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub days: u32,
    pub reason: WindowReason,
    pub volatility: f64,
    pub entries_per_day: f64,
}

/// Pick an analysis window from the shape of the whole history.
///
/// Volatile moods narrow the window to `volatile_days`; dense journaling
/// narrows it to `frequent_days`; anything else gets `default_days`.
/// Days covered counts from the earliest entry to `now`, inclusive.
pub fn analysis_window(history: &[MoodEntry], now: DateTime<Utc>, cfg: &TrendConfig) -> AnalysisWindow {
    let Some(earliest) = history.iter().map(|e| e.timestamp).min() else {
        return AnalysisWindow {
            days: cfg.default_days,
            reason: WindowReason::NoEntries,
            volatility: 0.0,
            entries_per_day: 0.0,
        };
    };

    let days_covered = ((now - earliest).num_days() + 1).max(1);
    let entries_per_day = history.len() as f64 / days_covered as f64;
    let scores: Vec<f64> = history.iter().map(|e| e.mood_score.as_f64()).collect();
    let volatility = volatility(&scores);

    let (days, reason) = if volatility > cfg.volatile_above {
        (cfg.volatile_days, WindowReason::HighVolatility)
    } else if entries_per_day > cfg.frequent_per_day {
        (cfg.frequent_days, WindowReason::FrequentEntries)
    } else {
        (cfg.default_days, WindowReason::Default)
    };

    tracing::debug!(days, %reason, volatility, entries_per_day, "chose analysis window");

    AnalysisWindow {
        days,
        reason,
        volatility,
        entries_per_day,
    }
}

/// Entries no older than `window.days` before `now`. History is oldest-first.
pub fn within_window<'a>(
    history: &'a [MoodEntry],
    window: &AnalysisWindow,
    now: DateTime<Utc>,
) -> &'a [MoodEntry] {
    let cutoff = now - Duration::days(i64::from(window.days));
    let start = history.partition_point(|e| e.timestamp < cutoff);
    &history[start..]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionReason {
    /// The window mean is low on its own.
    LowMean,
    /// The window keeps sliding and sits below the decline cutoff.
    SustainedDecline,
}

/// The intervention signal along with the numbers behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterventionDecision {
    pub intervene: bool,
    pub reason: Option<InterventionReason>,
    pub mean: Option<f64>,
    pub declining: bool,
    pub considered: usize,
}

/// Decide whether to offer a supportive prompt.
///
/// Needs at least `min_entries` entries. Looks at the last `window_size`
/// entries in chronological order and triggers when the mean is below
/// `low_mean`, or when the window is declining and its mean is below
/// `decline_mean`. Carries no state; cooldowns belong to the caller.
pub fn intervention_check(history: &[MoodEntry], cfg: &InterventionConfig) -> InterventionDecision {
    if history.len() < cfg.min_entries || cfg.window_size == 0 {
        return InterventionDecision {
            intervene: false,
            reason: None,
            mean: None,
            declining: false,
            considered: 0,
        };
    }

    let window = recent_scores(history, cfg.window_size);
    let mean = util::mean(&window);
    let declining = is_declining(&window, cfg.decline_tolerance);

    let reason = match mean {
        Some(m) if m < cfg.low_mean => Some(InterventionReason::LowMean),
        Some(m) if declining && m < cfg.decline_mean => Some(InterventionReason::SustainedDecline),
        _ => None,
    };

    if reason.is_some() {
        tracing::info!(?reason, ?mean, declining, "intervention triggered");
    }

    InterventionDecision {
        intervene: reason.is_some(),
        reason,
        mean,
        declining,
        considered: window.len(),
    }
}

/// `intervention_check(..).intervene`
pub fn should_intervene(history: &[MoodEntry], cfg: &InterventionConfig) -> bool {
    intervention_check(history, cfg).intervene
}

/// No entry rises more than `tolerance` above the one before it.
/// Walked oldest to newest.
pub fn is_declining(window: &[f64], tolerance: f64) -> bool {
    window.windows(2).all(|pair| pair[1] <= pair[0] + tolerance)
}

/// Scores of the last `n` entries, oldest first.
fn recent_scores(history: &[MoodEntry], n: usize) -> Vec<f64> {
    let start = history.len().saturating_sub(n);
    history[start..].iter().map(|e| e.mood_score.as_f64()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::MoodScore;
    use crate::storage::entry::Source;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    /// Build an oldest-first history, one entry per day.
    fn history(scores: &[i64]) -> Vec<MoodEntry> {
        spaced(scores, Duration::days(1))
    }

    fn spaced(scores: &[i64], step: Duration) -> Vec<MoodEntry> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| MoodEntry {
                id: i as i64 + 1,
                user: "me".into(),
                timestamp: start() + step * i as i32,
                mood_score: MoodScore::new(s),
                source: Source::Text,
                raw_features: None,
                note: None,
            })
            .collect()
    }

    fn trend(scores: &[i64]) -> TrendStatus {
        evaluate_trend(&history(scores), 7, &TrendConfig::default()).unwrap()
    }

    fn intervene(scores: &[i64]) -> bool {
        should_intervene(&history(scores), &InterventionConfig::default())
    }

    #[test]
    fn empty_history_is_stable_without_average() {
        let status = trend(&[]);
        assert_eq!(status.classification, TrendClass::Stable);
        assert_eq!(status.average_score, None);
        assert_eq!(status.window_size, 0);
        assert!(status.message.is_some());
    }

    #[test]
    fn all_eights_are_stable() {
        let status = trend(&[8, 8, 8, 8, 8, 8, 8]);
        assert_eq!(status.classification, TrendClass::Stable);
        assert_eq!(status.average_score, Some(8.0));
        assert_eq!(status.window_size, 7);
        assert_eq!(status.direction, TrendDirection::Steady);
    }

    #[test]
    fn low_average_is_negative() {
        let status = trend(&[3, 2, 4, 3, 3, 4, 2]);
        assert_eq!(status.average_score, Some(3.0));
        assert_eq!(status.classification, TrendClass::Negative);
    }

    #[test]
    fn band_edges() {
        assert_eq!(trend(&[7]).classification, TrendClass::Stable);
        assert_eq!(trend(&[4]).classification, TrendClass::Fluctuating);
        assert_eq!(trend(&[6, 7]).classification, TrendClass::Fluctuating);
        assert_eq!(trend(&[3, 4]).classification, TrendClass::Negative);
    }

    #[test]
    fn only_the_window_counts() {
        // Ten old bad days followed by seven good ones
        let mut scores = vec![1; 10];
        scores.extend([9; 7]);
        let status = trend(&scores);
        assert_eq!(status.window_size, 7);
        assert_eq!(status.average_score, Some(9.0));
    }

    #[test]
    fn short_history_uses_what_exists() {
        let status = trend(&[5, 6, 7]);
        assert_eq!(status.window_size, 3);
        assert_eq!(status.average_score, Some(6.0));
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        // 38 / 7 = 5.428...
        let status = trend(&[5, 5, 6, 6, 5, 5, 6]);
        assert_eq!(status.average_score, Some(5.4));
    }

    #[test]
    fn zero_window_is_a_configuration_error() {
        let result = evaluate_trend(&history(&[5]), 0, &TrendConfig::default());
        assert!(matches!(result, Err(ScoringError::Configuration(_))));
    }

    #[test]
    fn direction_of_travel() {
        assert_eq!(trend(&[3, 3, 3, 5, 7, 7, 7]).direction, TrendDirection::Improving);
        assert_eq!(trend(&[8, 8, 8, 6, 4, 4, 4]).direction, TrendDirection::Declining);
        assert_eq!(trend(&[5]).direction, TrendDirection::Insufficient);
    }

    #[test]
    fn never_intervenes_on_short_history() {
        assert!(!intervene(&[]));
        assert!(!intervene(&[1]));
        assert!(!intervene(&[1, 1, 1, 1]));
    }

    #[test]
    fn low_mean_triggers() {
        let decision = intervention_check(&history(&[2, 5, 2, 5, 2]), &InterventionConfig::default());
        assert!(decision.intervene);
        assert_eq!(decision.reason, Some(InterventionReason::LowMean));
        assert!(!decision.declining);
    }

    #[test]
    fn decline_below_cutoff_triggers() {
        // mean 5.0, each step down or flat
        let decision = intervention_check(
            &history(&[7, 6, 6, 5, 4, 4, 3]),
            &InterventionConfig::default(),
        );
        assert!(decision.declining);
        assert_eq!(decision.reason, Some(InterventionReason::SustainedDecline));
    }

    #[test]
    fn decline_above_cutoff_does_not_trigger() {
        // declining but mean 7.0
        assert!(!intervene(&[9, 8, 8, 7, 6, 6, 5]));
    }

    #[test]
    fn rises_within_tolerance_still_count_as_decline() {
        assert!(is_declining(&[6.0, 7.0, 6.0, 5.0], 1.0));
        assert!(!is_declining(&[5.0, 7.0, 6.0, 5.0], 1.0));
    }

    #[test]
    fn flat_middling_history_triggers() {
        // Flat is within tolerance, so a steady 5 counts as declining below 5.5
        assert!(intervene(&[5, 5, 5, 5, 5]));
    }

    #[test]
    fn window_limits_to_recent_seven() {
        // Old lows fall outside the window; the last seven are fine
        let mut scores = vec![1; 5];
        scores.extend([8, 7, 8, 7, 8, 7, 8]);
        assert!(!intervene(&scores));
    }

    #[test]
    fn ordering_changes_the_decline_verdict() {
        // Chronologically this is a recovery: 2 -> 8, mean ~5.1.
        let scores = [2, 4, 4, 5, 6, 7, 8];
        let entries = history(&scores);
        let cfg = InterventionConfig::default();

        let decision = intervention_check(&entries, &cfg);
        assert!(!decision.declining);
        assert!(!decision.intervene);

        // Fed newest-first without conversion, the same data reads as a slide.
        let mut reversed = entries.clone();
        reversed.reverse();
        let misread = intervention_check(&reversed, &cfg);
        assert!(misread.declining);
        assert!(misread.intervene);

        // Converting restores the chronological reading.
        let fixed = chronological(reversed, HistoryOrder::NewestFirst);
        assert_eq!(intervention_check(&fixed, &cfg), decision);
    }

    #[test]
    fn deterministic() {
        let entries = history(&[4, 6, 5, 3, 6, 2, 5]);
        let cfg = TrendConfig::default();
        assert_eq!(
            evaluate_trend(&entries, 7, &cfg).unwrap(),
            evaluate_trend(&entries, 7, &cfg).unwrap()
        );
    }

    #[test]
    fn volatility_is_scaled_sample_spread() {
        assert_eq!(volatility(&[]), 0.0);
        assert_eq!(volatility(&[5.0]), 0.0);
        assert_eq!(volatility(&[6.0, 6.0, 6.0]), 0.0);
        // sample stdev of [4, 8] is 2.828..., / 4.5
        assert!((volatility(&[4.0, 8.0]) - 8f64.sqrt() / 4.5).abs() < 1e-9);
        assert_eq!(volatility(&[1.0, 10.0, 1.0, 10.0]), 1.0);
    }

    #[test]
    fn empty_history_gets_the_default_window() {
        let window = analysis_window(&[], start(), &TrendConfig::default());
        assert_eq!(window.days, 7);
        assert_eq!(window.reason, WindowReason::NoEntries);
    }

    #[test]
    fn volatile_history_narrows_to_three_days() {
        let entries = history(&[2, 9, 3, 8, 2]);
        let now = entries[4].timestamp;
        let window = analysis_window(&entries, now, &TrendConfig::default());
        assert!(window.volatility > 0.3);
        assert_eq!(window.days, 3);
        assert_eq!(window.reason, WindowReason::HighVolatility);
        assert_eq!(window.reason.to_string(), "high volatility detected");
    }

    #[test]
    fn frequent_entries_narrow_to_five_days() {
        // Nine steady entries six hours apart: 9 over 3 days covered
        let entries = spaced(&[6, 6, 6, 6, 7, 6, 6, 6, 6], Duration::hours(6));
        let now = entries[8].timestamp;
        let window = analysis_window(&entries, now, &TrendConfig::default());
        assert!((window.entries_per_day - 3.0).abs() < 1e-9);
        assert_eq!(window.days, 5);
        assert_eq!(window.reason, WindowReason::FrequentEntries);
    }

    #[test]
    fn steady_daily_journaling_keeps_a_week() {
        let entries = history(&[6, 6, 7, 6, 6]);
        let now = entries[4].timestamp + Duration::hours(1);
        let window = analysis_window(&entries, now, &TrendConfig::default());
        assert!((window.entries_per_day - 1.0).abs() < 1e-9);
        assert_eq!(window.days, 7);
        assert_eq!(window.reason, WindowReason::Default);
    }

    #[test]
    fn volatility_wins_over_frequency() {
        let entries = spaced(&[1, 9, 1, 9, 1, 9, 1, 9, 1], Duration::hours(6));
        let now = entries[8].timestamp;
        let window = analysis_window(&entries, now, &TrendConfig::default());
        assert!(window.entries_per_day > 2.0);
        assert_eq!(window.reason, WindowReason::HighVolatility);
    }

    #[test]
    fn window_keeps_only_recent_days() {
        let entries = history(&[5, 5, 5, 5, 5, 5, 5, 6, 7, 8]);
        let now = entries[9].timestamp + Duration::hours(3);
        let window = AnalysisWindow {
            days: 3,
            reason: WindowReason::HighVolatility,
            volatility: 0.5,
            entries_per_day: 1.0,
        };
        let recent = within_window(&entries, &window, now);
        let scores: Vec<u8> = recent.iter().map(|e| e.mood_score.get()).collect();
        assert_eq!(scores, vec![6, 7, 8]);
        assert!(within_window(&entries, &window, now + Duration::days(30)).is_empty());
    }
}
