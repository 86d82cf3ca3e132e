pub mod wav;

use std::path::Path;

use anyhow::{Context, Result};

use crate::dsp::features::{self, FeatureConfig};
use crate::scoring::voice::VoiceFeatures;

/// Load a recording and extract its feature snapshot.
///
/// `Ok(None)` means the file was readable but too short to analyze.
pub fn features_from_wav(path: &Path, config: &FeatureConfig) -> Result<Option<VoiceFeatures>> {
    let (samples, sample_rate) =
        wav::load_mono(path).with_context(|| format!("Failed to load {}", path.display()))?;

    let duration = samples.len() as f32 / sample_rate.max(1) as f32;
    tracing::debug!(path = %path.display(), duration, sample_rate, "loaded recording");

    let snapshot = features::extract(&samples, sample_rate, config);
    if snapshot.is_none() {
        tracing::warn!(path = %path.display(), duration, "recording too short for feature extraction");
    }
    Ok(snapshot)
}
