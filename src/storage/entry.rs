use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::aggregate::DiscrepancyLevel;
use crate::scoring::voice::{Clarity, VoiceFeatures};
use crate::scoring::MoodScore;

/// One stored mood check-in.
///
/// Entries are appended, never edited. `id` is assigned by the repository and
/// increases with creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: i64,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub mood_score: MoodScore,
    pub source: Source,
    pub raw_features: Option<RawFeatures>,
    /// Excerpt of the journal text, if any.
    pub note: Option<String>,
}

/// A check-in that has been scored but not stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMoodEntry {
    pub user: String,
    pub timestamp: DateTime<Utc>,
    pub mood_score: MoodScore,
    pub source: Source,
    pub raw_features: Option<RawFeatures>,
    pub note: Option<String>,
}

impl NewMoodEntry {
    pub fn into_entry(self, id: i64) -> MoodEntry {
        MoodEntry {
            id,
            user: self.user,
            timestamp: self.timestamp,
            mood_score: self.mood_score,
            source: self.source,
            raw_features: self.raw_features,
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Text,
    Voice,
    /// Both modalities, merged by the aggregator.
    Combined,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Text => "text",
            Source::Voice => "voice",
            Source::Combined => "combined",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Source::Text),
            "voice" => Ok(Source::Voice),
            "combined" => Ok(Source::Combined),
            other => anyhow::bail!("Unknown entry source: {other}"),
        }
    }
}

/// What the scorer saw, kept alongside the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawFeatures {
    Text {
        positive_words: Vec<String>,
        negative_words: Vec<String>,
        negations: usize,
        exclamations: usize,
    },
    Voice {
        features: VoiceFeatures,
        clarity: Clarity,
    },
    Combined {
        text_score: f64,
        voice_score: f64,
        final_score: f64,
        discrepancy: DiscrepancyLevel,
        features: VoiceFeatures,
        clarity: Clarity,
        /// Confidence that scaled the voice weight.
        #[serde(default = "full_confidence")]
        voice_confidence: f64,
    },
}

fn full_confidence() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn source_parses_its_own_names() {
        for source in [Source::Text, Source::Voice, Source::Combined] {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert!("audio".parse::<Source>().is_err());
    }

    #[test]
    fn entry_json_roundtrip() {
        let entry = MoodEntry {
            id: 3,
            user: "me".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 8, 21, 30, 0).unwrap(),
            mood_score: MoodScore::new(4),
            source: Source::Voice,
            raw_features: Some(RawFeatures::Voice {
                features: VoiceFeatures {
                    energy: 0.04,
                    rms: 0.18,
                    zero_crossing_rate: 85.0,
                    spectral_centroid: 1450.0,
                },
                clarity: Clarity::Unclear,
            }),
            note: None,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"kind\":\"voice\""));
        assert!(json.contains("2026-02-08T21:30:00Z"));

        let loaded: MoodEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, entry);
    }

    #[test]
    fn combined_features_without_confidence_read_as_fully_trusted() {
        let json = r#"{"kind":"combined","text_score":6.0,"voice_score":7.0,"final_score":6.6,
            "discrepancy":"low","features":{"energy":0.045,"rms":0.3,"zero_crossing_rate":50.0,
            "spectral_centroid":1500.0},"clarity":"moderate"}"#;
        match serde_json::from_str::<RawFeatures>(json).unwrap() {
            RawFeatures::Combined { voice_confidence, .. } => assert_eq!(voice_confidence, 1.0),
            other => panic!("unexpected features: {other:?}"),
        }
    }
}
