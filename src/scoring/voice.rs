use serde::{Deserialize, Serialize};

use super::MoodScore;
use crate::config::VoiceScoringConfig;
use crate::util;

/// Acoustic features summarizing one voice check-in.
///
/// Produced by `dsp::features` from a recording. All values are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeatures {
    /// Mean per-frame energy (mean squared sample, so a full-scale sine is 0.5).
    pub energy: f64,
    /// Root-mean-square amplitude over the whole recording.
    pub rms: f64,
    /// Mean zero crossings per frame.
    pub zero_crossing_rate: f64,
    /// Mean spectral centroid in Hz.
    pub spectral_centroid: f64,
}

impl VoiceFeatures {
    /// A snapshot is usable only if every feature is finite and non-negative.
    pub fn is_complete(&self) -> bool {
        [
            self.energy,
            self.rms,
            self.zero_crossing_rate,
            self.spectral_centroid,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Qualitative label derived from RMS level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clarity {
    Clear,
    Moderate,
    Unclear,
}

impl std::fmt::Display for Clarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Clarity::Clear => write!(f, "clear"),
            Clarity::Moderate => write!(f, "moderate"),
            Clarity::Unclear => write!(f, "unclear"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    pub score: MoodScore,
    pub clarity: Clarity,
    /// min(energy * scale, 10)
    pub energy_score: f64,
    /// max(0, 10 - zcr / divisor)
    pub clarity_score: f64,
    /// How far the score can be trusted, in [0.1, 1]. See `confidence`.
    pub confidence: f64,
}

/// Floor for `confidence`; a recording never counts for nothing.
pub const MIN_CONFIDENCE: f64 = 0.1;
/// No spectral content at all: nothing voice-like was captured.
const NO_SPECTRUM_PENALTY: f64 = 0.5;
/// Level below the unclear cutoff.
const QUIET_PENALTY: f64 = 0.6;
/// Crossing rate so high the clarity sub-score bottoms out (noise).
const NOISY_PENALTY: f64 = 0.7;

/// Score a voice feature snapshot.
///
/// Returns `None` when there is no snapshot yet or it is incomplete. Callers
/// must keep "nothing to score" apart from a low score and never substitute one.
pub fn score_voice(
    features: Option<&VoiceFeatures>,
    cfg: &VoiceScoringConfig,
) -> Option<VoiceAnalysis> {
    let features = match features {
        Some(f) if f.is_complete() => f,
        Some(f) => {
            tracing::warn!(?f, "incomplete voice feature snapshot, not scoring");
            return None;
        }
        None => return None,
    };

    let energy_score = (features.energy * cfg.energy_scale).min(10.0);
    let clarity_score = (10.0 - features.zero_crossing_rate / cfg.zcr_divisor).max(0.0);
    let combined = energy_score * cfg.energy_weight + clarity_score * cfg.clarity_weight;
    let score = MoodScore::from_f64(util::round_score(combined));

    let clarity = clarity_label(features.rms, cfg);
    let confidence = confidence(features, cfg);

    tracing::debug!(energy_score, clarity_score, score = score.get(), %clarity, "scored voice");

    Some(VoiceAnalysis {
        score,
        clarity,
        energy_score,
        clarity_score,
        confidence,
    })
}

/// Trust in a voice score, from 1.0 down to `MIN_CONFIDENCE`.
///
/// Penalties multiply: a silent spectrum, a level under `rms_unclear`, and a
/// crossing rate that zeroes the clarity sub-score.
pub fn confidence(features: &VoiceFeatures, cfg: &VoiceScoringConfig) -> f64 {
    let mut confidence = 1.0;
    if features.spectral_centroid <= 0.0 {
        confidence *= NO_SPECTRUM_PENALTY;
    }
    if clarity_label(features.rms, cfg) == Clarity::Unclear {
        confidence *= QUIET_PENALTY;
    }
    if features.zero_crossing_rate / cfg.zcr_divisor >= 10.0 {
        confidence *= NOISY_PENALTY;
    }
    confidence.clamp(MIN_CONFIDENCE, 1.0)
}

fn clarity_label(rms: f64, cfg: &VoiceScoringConfig) -> Clarity {
    if rms > cfg.rms_clear {
        Clarity::Clear
    } else if rms < cfg.rms_unclear {
        Clarity::Unclear
    } else {
        Clarity::Moderate
    }
}
