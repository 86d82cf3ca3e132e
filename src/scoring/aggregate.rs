use serde::{Deserialize, Serialize};

use super::{MAX_SCORE, MIN_SCORE};
use crate::config::AggregatorConfig;
use crate::error::ScoringError;
use crate::util;

/// How far apart the text and voice scores are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyLevel {
    Low,
    Moderate,
    High,
}

/// Which modality reads more positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyDirection {
    /// Words are brighter than the tone of voice.
    TextHigher,
    /// Tone of voice is brighter than the words.
    VoiceHigher,
    Agree,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub level: DiscrepancyLevel,
    pub magnitude: f64,
    pub direction: DiscrepancyDirection,
}

impl Discrepancy {
    pub fn is_high(&self) -> bool {
        self.level == DiscrepancyLevel::High
    }

    /// Plain-language reading of a disagreement, if there is one worth saying.
    pub fn interpretation(&self) -> Option<&'static str> {
        if self.level == DiscrepancyLevel::Low {
            return None;
        }
        match self.direction {
            DiscrepancyDirection::TextHigher => {
                Some("Words sound more positive than the voice; may be putting on a brave face")
            }
            DiscrepancyDirection::VoiceHigher => {
                Some("Voice sounds more positive than the words; may be venting but coping")
            }
            DiscrepancyDirection::Agree => None,
        }
    }
}

/// Band of the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodCategory {
    VeryLow,
    Low,
    Neutral,
    Positive,
    VeryPositive,
}

impl MoodCategory {
    pub fn from_score(score: f64) -> Self {
        if score < 3.0 {
            MoodCategory::VeryLow
        } else if score < 5.0 {
            MoodCategory::Low
        } else if score < 7.0 {
            MoodCategory::Neutral
        } else if score < 9.0 {
            MoodCategory::Positive
        } else {
            MoodCategory::VeryPositive
        }
    }
}

impl std::fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MoodCategory::VeryLow => "very low",
            MoodCategory::Low => "low",
            MoodCategory::Neutral => "neutral",
            MoodCategory::Positive => "positive",
            MoodCategory::VeryPositive => "very positive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub final_score: f64,
    pub text_score: f64,
    pub voice_score: f64,
    pub text_weight: f64,
    pub voice_weight: f64,
    pub discrepancy: Discrepancy,
    pub category: MoodCategory,
}

/// Combine a text score and a voice score for the same check-in.
///
/// Both modalities must be present; callers with only one never call this.
/// Fails with `ScoringError::Configuration` if the weights are negative or
/// do not sum to 1.0, or if either score is not a finite value in [1, 10].
pub fn combine(
    text_score: f64,
    voice_score: f64,
    cfg: &AggregatorConfig,
) -> Result<CombinedResult, ScoringError> {
    cfg.validate()?;
    check_score("text", text_score)?;
    check_score("voice", voice_score)?;
    Ok(weighted(text_score, voice_score, cfg.text_weight, cfg.voice_weight, cfg))
}

/// Like `combine`, but shrinks the voice weight by a confidence in [0, 1].
/// The text weight takes up the remainder.
pub fn combine_with_confidence(
    text_score: f64,
    voice_score: f64,
    confidence: f64,
    cfg: &AggregatorConfig,
) -> Result<CombinedResult, ScoringError> {
    cfg.validate()?;
    check_score("text", text_score)?;
    check_score("voice", voice_score)?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ScoringError::config(format!(
            "voice confidence {confidence} is outside [0, 1]"
        )));
    }
    let voice_weight = cfg.voice_weight * confidence;
    let text_weight = 1.0 - voice_weight;
    Ok(weighted(text_score, voice_score, text_weight, voice_weight, cfg))
}

fn check_score(name: &str, score: f64) -> Result<(), ScoringError> {
    if (MIN_SCORE as f64..=MAX_SCORE as f64).contains(&score) {
        Ok(())
    } else {
        Err(ScoringError::config(format!(
            "{name} score {score} is outside [{MIN_SCORE}, {MAX_SCORE}]"
        )))
    }
}

fn weighted(
    text_score: f64,
    voice_score: f64,
    text_weight: f64,
    voice_weight: f64,
    cfg: &AggregatorConfig,
) -> CombinedResult {
    let final_score = voice_score * voice_weight + text_score * text_weight;
    let discrepancy = discrepancy(text_score, voice_score, cfg);

    if discrepancy.is_high() {
        tracing::info!(
            text_score,
            voice_score,
            magnitude = discrepancy.magnitude,
            "text and voice disagree"
        );
    }

    CombinedResult {
        final_score,
        text_score,
        voice_score,
        text_weight,
        voice_weight,
        discrepancy,
        category: MoodCategory::from_score(final_score),
    }
}

/// Classify |text - voice| against the configured bands.
pub fn discrepancy(text_score: f64, voice_score: f64, cfg: &AggregatorConfig) -> Discrepancy {
    // Snap so 7.0 - 4.5 style differences compare exactly against the bands.
    let magnitude = util::round_to((text_score - voice_score).abs(), 6);

    let level = if magnitude >= cfg.high_discrepancy {
        DiscrepancyLevel::High
    } else if magnitude >= cfg.moderate_discrepancy {
        DiscrepancyLevel::Moderate
    } else {
        DiscrepancyLevel::Low
    };

    let direction = if magnitude == 0.0 {
        DiscrepancyDirection::Agree
    } else if text_score > voice_score {
        DiscrepancyDirection::TextHigher
    } else {
        DiscrepancyDirection::VoiceHigher
    };

    Discrepancy {
        level,
        magnitude,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_worked_example() {
        // 4.5 * 0.6 + 7 * 0.4 = 2.7 + 2.8 = 5.5
        let result = combine(7.0, 4.5, &AggregatorConfig::default()).unwrap();
        assert!((result.final_score - 5.5).abs() < 1e-9);
        assert!((result.discrepancy.magnitude - 2.5).abs() < 1e-9);
        assert_eq!(result.discrepancy.level, DiscrepancyLevel::High);
        assert_eq!(result.discrepancy.direction, DiscrepancyDirection::TextHigher);
        assert!(result.discrepancy.interpretation().is_some());
        assert_eq!(result.category, MoodCategory::Neutral);
    }

    #[test]
    fn discrepancy_bands() {
        let cfg = AggregatorConfig::default();
        assert_eq!(discrepancy(5.0, 5.0, &cfg).level, DiscrepancyLevel::Low);
        assert_eq!(discrepancy(5.0, 5.0, &cfg).direction, DiscrepancyDirection::Agree);
        assert_eq!(discrepancy(5.0, 6.4, &cfg).level, DiscrepancyLevel::Low);
        assert_eq!(discrepancy(5.0, 6.5, &cfg).level, DiscrepancyLevel::Moderate);
        assert_eq!(discrepancy(3.0, 5.4, &cfg).level, DiscrepancyLevel::Moderate);
        assert_eq!(discrepancy(2.0, 9.0, &cfg).level, DiscrepancyLevel::High);
        assert_eq!(
            discrepancy(2.0, 9.0, &cfg).direction,
            DiscrepancyDirection::VoiceHigher
        );
    }

    #[test]
    fn low_discrepancy_has_no_interpretation() {
        let d = discrepancy(5.0, 5.5, &AggregatorConfig::default());
        assert!(d.interpretation().is_none());
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let cfg = AggregatorConfig {
            text_weight: 0.3,
            voice_weight: 0.6,
            ..AggregatorConfig::default()
        };
        assert!(matches!(
            combine(5.0, 5.0, &cfg),
            Err(ScoringError::Configuration(_))
        ));
    }

    #[test]
    fn custom_weights() {
        let cfg = AggregatorConfig {
            text_weight: 0.5,
            voice_weight: 0.5,
            ..AggregatorConfig::default()
        };
        let result = combine(8.0, 4.0, &cfg).unwrap();
        assert!((result.final_score - 6.0).abs() < 1e-9);
    }

    #[test]
    fn zero_confidence_ignores_voice() {
        let result =
            combine_with_confidence(8.0, 2.0, 0.0, &AggregatorConfig::default()).unwrap();
        assert_eq!(result.voice_weight, 0.0);
        assert!((result.final_score - 8.0).abs() < 1e-9);
        // The disagreement is still reported
        assert!(result.discrepancy.is_high());
    }

    #[test]
    fn half_confidence_halves_voice_weight() {
        let result =
            combine_with_confidence(6.0, 4.0, 0.5, &AggregatorConfig::default()).unwrap();
        assert!((result.voice_weight - 0.3).abs() < 1e-9);
        assert!((result.text_weight - 0.7).abs() < 1e-9);
        // 4 * 0.3 + 6 * 0.7 = 5.4
        assert!((result.final_score - 5.4).abs() < 1e-9);
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let cfg = AggregatorConfig::default();
        assert!(combine_with_confidence(5.0, 5.0, 1.5, &cfg).is_err());
        assert!(combine_with_confidence(5.0, 5.0, -0.1, &cfg).is_err());
    }

    #[test]
    fn rejects_scores_outside_the_scale() {
        let cfg = AggregatorConfig::default();
        assert!(matches!(
            combine(15.0, -3.0, &cfg),
            Err(ScoringError::Configuration(_))
        ));
        assert!(combine(7.0, 0.5, &cfg).is_err());
        assert!(combine_with_confidence(10.5, 5.0, 1.0, &cfg).is_err());
        // The ends of the scale are fine
        assert!(combine(1.0, 10.0, &cfg).is_ok());
    }

    #[test]
    fn rejects_non_finite_scores() {
        let cfg = AggregatorConfig::default();
        assert!(matches!(
            combine(f64::NAN, 5.0, &cfg),
            Err(ScoringError::Configuration(_))
        ));
        assert!(combine(5.0, f64::INFINITY, &cfg).is_err());
        assert!(combine_with_confidence(f64::NAN, 5.0, 0.5, &cfg).is_err());
    }

    #[test]
    fn categories() {
        assert_eq!(MoodCategory::from_score(2.9), MoodCategory::VeryLow);
        assert_eq!(MoodCategory::from_score(4.0), MoodCategory::Low);
        assert_eq!(MoodCategory::from_score(5.5), MoodCategory::Neutral);
        assert_eq!(MoodCategory::from_score(8.0), MoodCategory::Positive);
        assert_eq!(MoodCategory::from_score(9.5), MoodCategory::VeryPositive);
    }
}
