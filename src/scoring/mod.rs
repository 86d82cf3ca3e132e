//! Mood scoring pipeline.
//!
//! Four pure stages, leaf to root:
//!   - `text`: lexicon heuristics over journal text
//!   - `voice`: thresholds over an acoustic feature snapshot
//!   - `aggregate`: weighted combination of both modalities
//!   - `trend`: classification of a user's history and the intervention signal
//!
//! Nothing here holds state between calls or touches storage. Callers pass
//! snapshots in and decide what to persist.

pub mod aggregate;
pub mod lexicon;
pub mod text;
pub mod trend;
pub mod voice;

use serde::{Deserialize, Serialize};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// An integer mood score, always within [1, 10].
///
/// Every constructor clamps, including deserialization, so an out-of-range
/// value can never be stored or passed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct MoodScore(u8);

impl MoodScore {
    pub const NEUTRAL: MoodScore = MoodScore(5);

    pub fn new(value: i64) -> Self {
        Self(value.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8)
    }

    /// Round half away from zero, then clamp. NaN maps to neutral.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::NEUTRAL;
        }
        Self(value.round().clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl From<i64> for MoodScore {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<MoodScore> for u8 {
    fn from(score: MoodScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for MoodScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/10", self.0)
    }
}
