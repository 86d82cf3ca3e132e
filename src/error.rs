use thiserror::Error;

/// Errors raised by the scoring core.
///
/// Everything above the core (storage, CLI, reports) works in `anyhow::Result`
/// and wraps these with context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// Weights that do not sum to 1.0, a zero-length window, a confidence
    /// outside [0, 1], or thresholds out of order.
    #[error("invalid scoring configuration: {0}")]
    Configuration(String),

    /// A voice score was required but no complete feature snapshot exists.
    #[error("no voice features available to score")]
    MissingFeatures,

    /// A check-in carried neither text nor a recording.
    #[error("nothing to score: provide text, a recording, or both")]
    EmptyCheckIn,
}

impl ScoringError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
