use std::f32::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::scoring::voice::VoiceFeatures;
use crate::util;

/// Framing for feature extraction, in samples.
#[derive(Debug, Clone, Copy)]
pub struct FeatureConfig {
    pub frame_size: usize,
    pub hop_size: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            hop_size: 512,
        }
    }
}

/// Per-frame measurements before averaging.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameFeatures {
    energy: f32,
    zero_crossings: usize,
    /// None for a silent frame (no spectral mass to take a centroid of).
    centroid_hz: Option<f32>,
}

/// Summarize a recording as a `VoiceFeatures` snapshot.
///
/// The signal is cut into frames of `frame_size` samples, `hop_size` apart.
/// For each frame:
///   energy         = mean squared sample (independent of frame size)
///   zero crossings = number of sign changes between adjacent samples
///   centroid       = magnitude-weighted mean frequency of the Hann-windowed FFT
///
/// energy, zero-crossing rate and centroid are means over frames; the
/// centroid skips silent frames. RMS is taken over the whole signal.
///
/// Returns None if the recording is shorter than one frame.
pub fn extract(samples: &[f32], sample_rate: u32, config: &FeatureConfig) -> Option<VoiceFeatures> {
    let frame_size = config.frame_size;
    let hop_size = config.hop_size.max(1);

    if frame_size == 0 || sample_rate == 0 || samples.len() < frame_size {
        return None;
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);
    let bin_hz = sample_rate as f32 / frame_size as f32;

    let mut frames = Vec::new();
    let mut pos = 0;
    while pos + frame_size <= samples.len() {
        let frame = &samples[pos..pos + frame_size];

        let mut buf: Vec<Complex<f32>> = frame
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buf);

        frames.push(FrameFeatures {
            energy: frame.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32,
            zero_crossings: zero_crossings(frame),
            centroid_hz: spectral_centroid(&buf[..frame_size / 2 + 1], bin_hz),
        });

        pos += hop_size;
    }

    let n = frames.len() as f64;
    let energy = frames.iter().map(|f| f.energy as f64).sum::<f64>() / n;
    let zcr = frames.iter().map(|f| f.zero_crossings as f64).sum::<f64>() / n;
    let centroids: Vec<f64> = frames
        .iter()
        .filter_map(|f| f.centroid_hz.map(|c| c as f64))
        .collect();

    Some(VoiceFeatures {
        energy,
        rms: util::rms(samples) as f64,
        zero_crossing_rate: zcr,
        spectral_centroid: util::mean(&centroids).unwrap_or(0.0),
    })
}

/// Count sign changes. Zero is treated as positive so a run of silence
/// contributes nothing.
fn zero_crossings(frame: &[f32]) -> usize {
    frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count()
}

/// Magnitude-weighted mean frequency over the non-negative half spectrum.
fn spectral_centroid(half_spectrum: &[Complex<f32>], bin_hz: f32) -> Option<f32> {
    let mut weighted = 0.0_f32;
    let mut total = 0.0_f32;
    for (k, c) in half_spectrum.iter().enumerate() {
        let mag = c.norm();
        weighted += k as f32 * bin_hz * mag;
        total += mag;
    }
    (total > 1e-9).then(|| weighted / total)
}

/// Symmetric Hann window: w(n) = 0.5 * (1 - cos(2πn / (N-1))).
fn hann_window(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 2.0 * PI / (n - 1) as f32;
    (0..n).map(|i| 0.5 * (1.0 - (scale * i as f32).cos())).collect()
}
