use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dsp::features::FeatureConfig;
use crate::error::ScoringError;
use crate::paths;

/// Application configuration, loaded from config.toml.
///
/// serde's `default` attribute means: if a field is missing from the TOML file,
/// use the value from the Default implementation instead of failing to parse.
/// The config file is optional; every threshold has a factory setting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub text: TextScoringConfig,
    pub voice: VoiceScoringConfig,
    pub aggregator: AggregatorConfig,
    pub trend: TrendConfig,
    pub intervention: InterventionConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// User that entries are filed under when `--user` is not given.
    pub default_user: String,
}

/// Weights for the lexicon-based text scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextScoringConfig {
    pub baseline: f64,
    /// Added per positive token, subtracted per negative token.
    pub word_weight: f64,
    /// Subtracted per negation marker followed by a word.
    pub negation_penalty: f64,
    /// Added per '!'.
    pub exclamation_bonus: f64,
    /// More question marks than this applies `question_penalty` once.
    pub question_threshold: usize,
    pub question_penalty: f64,
    /// Words appended to the built-in positive lexicon.
    pub extra_positive: Vec<String>,
    /// Words appended to the built-in negative lexicon.
    pub extra_negative: Vec<String>,
}

/// Thresholds for scoring a voice feature snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceScoringConfig {
    /// energy * energy_scale, capped at 10, is the energy sub-score.
    pub energy_scale: f64,
    /// zero_crossing_rate / zcr_divisor is subtracted from 10 for clarity.
    pub zcr_divisor: f64,
    pub energy_weight: f64,
    pub clarity_weight: f64,
    /// RMS above this is labelled clear.
    pub rms_clear: f64,
    /// RMS below this is labelled unclear.
    pub rms_unclear: f64,
}

/// Weights and discrepancy bands for combining text and voice scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub text_weight: f64,
    pub voice_weight: f64,
    /// |text - voice| at or above this is a high discrepancy.
    pub high_discrepancy: f64,
    /// |text - voice| at or above this (and below high) is moderate.
    pub moderate_discrepancy: f64,
}

/// Bands for classifying the mean of the trend window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub window_size: usize,
    /// Mean at or above this is stable.
    pub stable_min: f64,
    /// Mean below this is negative.
    pub negative_below: f64,
    /// Entries averaged at each end of the window for the direction.
    pub direction_span: usize,
    /// Difference between the two ends that counts as a direction change.
    pub direction_delta: f64,
    /// Adaptive window: volatility above this looks at `volatile_days` only.
    pub volatile_above: f64,
    /// Adaptive window: more entries per day than this looks at `frequent_days`.
    pub frequent_per_day: f64,
    pub volatile_days: u32,
    pub frequent_days: u32,
    pub default_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionConfig {
    /// Histories shorter than this never trigger.
    pub min_entries: usize,
    pub window_size: usize,
    /// Window mean below this triggers on its own.
    pub low_mean: f64,
    /// Window mean below this triggers when the window is declining.
    pub decline_mean: f64,
    /// How far an entry may rise over its predecessor and still count as declining.
    pub decline_tolerance: f64,
    /// Hours a dismissed prompt stays hidden. Used by the CLI, not the scorer.
    pub cooldown_hours: i64,
}

/// Framing for acoustic feature extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub frame_size: usize,
    pub hop_size: usize,
}

// --- Default implementations ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_user: "me".into(),
        }
    }
}

impl Default for TextScoringConfig {
    fn default() -> Self {
        Self {
            baseline: 5.0,
            word_weight: 0.5,
            negation_penalty: 0.3,
            exclamation_bonus: 0.2,
            question_threshold: 2,
            question_penalty: 0.3,
            extra_positive: Vec::new(),
            extra_negative: Vec::new(),
        }
    }
}

impl Default for VoiceScoringConfig {
    fn default() -> Self {
        Self {
            energy_scale: 100.0,
            zcr_divisor: 100.0,
            energy_weight: 0.6,
            clarity_weight: 0.4,
            rms_clear: 0.5,
            rms_unclear: 0.2,
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            text_weight: 0.4,
            voice_weight: 0.6,
            high_discrepancy: 2.5,
            moderate_discrepancy: 1.5,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_size: 7,
            stable_min: 7.0,
            negative_below: 4.0,
            direction_span: 3,
            direction_delta: 1.0,
            volatile_above: 0.3,
            frequent_per_day: 2.0,
            volatile_days: 3,
            frequent_days: 5,
            default_days: 7,
        }
    }
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            min_entries: 5,
            window_size: 7,
            low_mean: 4.0,
            decline_mean: 5.5,
            decline_tolerance: 1.0,
            cooldown_hours: 24,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            hop_size: 512,
        }
    }
}

/// Tolerance when checking that a pair of weights sums to 1.0.
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Check that two weights are non-negative and sum to 1.0.
pub fn validate_weight_pair(a_name: &str, a: f64, b_name: &str, b: f64) -> Result<(), ScoringError> {
    if !(a.is_finite() && b.is_finite()) || a < 0.0 || b < 0.0 {
        return Err(ScoringError::config(format!(
            "{a_name} ({a}) and {b_name} ({b}) must be non-negative"
        )));
    }
    if ((a + b) - 1.0).abs() > WEIGHT_EPSILON {
        return Err(ScoringError::config(format!(
            "{a_name} ({a}) + {b_name} ({b}) must sum to 1.0"
        )));
    }
    Ok(())
}

impl VoiceScoringConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        validate_weight_pair(
            "voice.energy_weight",
            self.energy_weight,
            "voice.clarity_weight",
            self.clarity_weight,
        )?;
        if self.zcr_divisor <= 0.0 {
            return Err(ScoringError::config("voice.zcr_divisor must be positive"));
        }
        if self.rms_unclear > self.rms_clear {
            return Err(ScoringError::config(
                "voice.rms_unclear must not exceed voice.rms_clear",
            ));
        }
        Ok(())
    }
}

impl AggregatorConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        validate_weight_pair(
            "aggregator.text_weight",
            self.text_weight,
            "aggregator.voice_weight",
            self.voice_weight,
        )?;
        if self.moderate_discrepancy > self.high_discrepancy {
            return Err(ScoringError::config(
                "aggregator.moderate_discrepancy must not exceed aggregator.high_discrepancy",
            ));
        }
        Ok(())
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.window_size == 0 {
            return Err(ScoringError::config("trend.window_size must be positive"));
        }
        if self.negative_below > self.stable_min {
            return Err(ScoringError::config(
                "trend.negative_below must not exceed trend.stable_min",
            ));
        }
        if self.volatile_days == 0 || self.frequent_days == 0 || self.default_days == 0 {
            return Err(ScoringError::config(
                "trend.volatile_days, trend.frequent_days and trend.default_days must be positive",
            ));
        }
        Ok(())
    }
}

impl InterventionConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.window_size == 0 {
            return Err(ScoringError::config(
                "intervention.window_size must be positive",
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Fail fast on thresholds the scorers would reject later.
    pub fn validate(&self) -> Result<(), ScoringError> {
        self.voice.validate()?;
        self.aggregator.validate()?;
        self.trend.validate()?;
        self.intervention.validate()?;
        if self.audio.frame_size == 0 || self.audio.hop_size == 0 {
            return Err(ScoringError::config(
                "audio.frame_size and audio.hop_size must be positive",
            ));
        }
        Ok(())
    }
}

/// Bridge between the user-facing config and the DSP parameters.
impl From<&AudioConfig> for FeatureConfig {
    fn from(cfg: &AudioConfig) -> Self {
        FeatureConfig {
            frame_size: cfg.frame_size,
            hop_size: cfg.hop_size,
        }
    }
}

/// Load the application config from $XDG_CONFIG_HOME/moodlog/config.toml.
/// If the file doesn't exist, returns defaults.
pub fn load_config() -> Result<AppConfig> {
    let path = paths::config_file();

    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.text.baseline, 5.0);
        assert_eq!(cfg.aggregator.voice_weight, 0.6);
        assert_eq!(cfg.trend.window_size, 7);
        assert_eq!(cfg.intervention.min_entries, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        // If the user only specifies some fields, the rest should use defaults
        let toml_str = r#"
[aggregator]
text_weight = 0.5
voice_weight = 0.5

[text]
extra_positive = ["stoked"]
"#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.aggregator.text_weight, 0.5);
        assert_eq!(cfg.aggregator.high_discrepancy, 2.5);
        assert_eq!(cfg.text.extra_positive, vec!["stoked".to_string()]);
        assert_eq!(cfg.text.word_weight, 0.5);
        assert_eq!(cfg.general.default_user, "me");
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let cfg = AggregatorConfig {
            text_weight: 0.5,
            voice_weight: 0.6,
            ..AggregatorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ScoringError::Configuration(_))));
    }

    #[test]
    fn rejects_negative_weight() {
        assert!(validate_weight_pair("a", -0.2, "b", 1.2).is_err());
    }

    #[test]
    fn rejects_zero_window() {
        let mut cfg = AppConfig::default();
        cfg.trend.window_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_day_adaptive_window() {
        let mut cfg = AppConfig::default();
        cfg.trend.volatile_days = 0;
        assert!(matches!(cfg.validate(), Err(ScoringError::Configuration(_))));
    }

    #[test]
    fn feature_config_conversion() {
        let cfg = AudioConfig {
            frame_size: 1024,
            hop_size: 256,
        };
        let feature_cfg: FeatureConfig = (&cfg).into();
        assert_eq!(feature_cfg.frame_size, 1024);
        assert_eq!(feature_cfg.hop_size, 256);
    }

    #[test]
    fn roundtrip_toml() {
        let cfg = AppConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let loaded: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded.voice.rms_clear, cfg.voice.rms_clear);
        assert_eq!(loaded.intervention.cooldown_hours, 24);
    }
}
