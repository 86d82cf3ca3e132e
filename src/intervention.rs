//! Supportive prompts shown when recent history calls for one, plus the
//! dismissal cooldown that keeps them from repeating on every check-in.

use chrono::{DateTime, Duration, Utc};

use crate::config::InterventionConfig;
use crate::scoring::trend::{InterventionDecision, InterventionReason};

#[derive(Debug, Clone, PartialEq)]
pub struct SupportPrompt {
    pub reason: InterventionReason,
    pub headline: String,
    pub suggestions: &'static [&'static str],
}

const LOW_MEAN_SUGGESTIONS: &[&str] = &[
    "Reach out to a trusted friend or family member today",
    "Practice basic self-care: eat something, drink water, try to rest",
    "Consider talking to a mental health professional this week",
    "If you're having thoughts of self-harm, call or text 988 (Suicide & Crisis Lifeline)",
];

const DECLINE_SUGGESTIONS: &[&str] = &[
    "Write down what has changed over the last few days",
    "Take a short walk or listen to something calming",
    "Connect with someone you trust, even briefly",
    "Consider talking to a therapist if this keeps up",
];

impl SupportPrompt {
    pub fn for_reason(reason: InterventionReason, mean: Option<f64>) -> Self {
        let mean = mean.map(|m| format!(" (recent average {m:.1}/10)")).unwrap_or_default();
        let (headline, suggestions) = match reason {
            InterventionReason::LowMean => (
                format!("Your mood has been low lately{mean}. You don't have to handle it alone."),
                LOW_MEAN_SUGGESTIONS,
            ),
            InterventionReason::SustainedDecline => (
                format!("Your mood has been sliding over your last few check-ins{mean}."),
                DECLINE_SUGGESTIONS,
            ),
        };
        Self {
            reason,
            headline,
            suggestions,
        }
    }
}

/// True while a dismissal is younger than `cooldown_hours`.
pub fn in_cooldown(last_dismissal: Option<DateTime<Utc>>, now: DateTime<Utc>, cooldown_hours: i64) -> bool {
    match last_dismissal {
        Some(at) => cooldown_hours > 0 && now < at + Duration::hours(cooldown_hours),
        None => false,
    }
}

/// The prompt to show for a decision, or None when nothing triggered or the
/// user recently dismissed one.
pub fn prompt_for(
    decision: &InterventionDecision,
    last_dismissal: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cfg: &InterventionConfig,
) -> Option<SupportPrompt> {
    let reason = decision.reason.filter(|_| decision.intervene)?;
    if in_cooldown(last_dismissal, now, cfg.cooldown_hours) {
        tracing::debug!(?reason, "intervention suppressed by cooldown");
        return None;
    }
    Some(SupportPrompt::for_reason(reason, decision.mean))
}
