use anyhow::Result;

use super::compare;
use crate::config::AppConfig;
use crate::scoring::aggregate::{DiscrepancyLevel, MoodCategory};
use crate::scoring::trend::{self, InterventionReason};
use crate::storage::{MoodEntry, RawFeatures};

/// Generate a markdown mood report for one user.
///
/// `entries` must be oldest-first. Returns the markdown content as a string.
/// The caller decides where to save it.
pub fn generate_report(user: &str, entries: &[MoodEntry], config: &AppConfig) -> Result<String> {
    let mut md = String::new();

    md.push_str(&format!("# Mood Report: {user}\n\n"));
    md.push_str(&format!(
        "Generated: {}  \n",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    ));
    md.push_str(&format!("Entries: {}\n\n", entries.len()));

    if entries.is_empty() {
        md.push_str("No entries to report.\n");
        return Ok(md);
    }

    md.push_str("---\n\n");

    // Trend summary
    let status = trend::evaluate_trend(entries, config.trend.window_size, &config.trend)?;
    md.push_str("## Trend\n\n");
    md.push_str(&format!(
        "- **Classification:** {} over the last {} entries\n",
        status.classification, status.window_size
    ));
    if let Some(avg) = status.average_score {
        md.push_str(&format!(
            "- **Average:** {avg:.1}/10 ({})\n",
            MoodCategory::from_score(avg)
        ));
    }
    md.push_str(&format!("- **Direction:** {}\n", status.direction));
    if let Some(cmp) = compare::compare_windows(entries, config.trend.window_size) {
        md.push_str(&format!(
            "- **Previous window:** {:.1} → {:.1} ({:+.1})\n",
            cmp.previous_mean,
            cmp.current_mean,
            cmp.delta()
        ));
    }
    md.push('\n');

    // Intervention
    let decision = trend::intervention_check(entries, &config.intervention);
    md.push_str("## Support Check\n\n");
    match decision.reason {
        Some(InterventionReason::LowMean) => md.push_str(
            "Recent mood has been **low**. Consider reaching out to someone you trust.\n\n",
        ),
        Some(InterventionReason::SustainedDecline) => md.push_str(
            "Recent mood has been **sliding** from one check-in to the next.\n\n",
        ),
        None if decision.considered == 0 => md.push_str(&format!(
            "Not enough entries yet (need {}).\n\n",
            config.intervention.min_entries
        )),
        None => md.push_str("Nothing of concern in recent entries.\n\n"),
    }

    // History table
    md.push_str("## History\n\n");
    md.push_str("| Date | Score | Source | Detail | Note |\n");
    md.push_str("|------|-------|--------|--------|------|\n");

    for entry in entries {
        md.push_str(&format!(
            "| {} | {}{} | {} | {} | {} |\n",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.mood_score.get(),
            flag_low(entry.mood_score.as_f64(), config.trend.negative_below),
            entry.source,
            detail(entry),
            entry.note.as_deref().map(table_cell).unwrap_or_default(),
        ));
    }
    md.push('\n');

    // Check-ins where words and voice disagreed
    let flagged: Vec<&MoodEntry> = entries
        .iter()
        .filter(|e| {
            matches!(
                e.raw_features,
                Some(RawFeatures::Combined {
                    discrepancy: DiscrepancyLevel::High,
                    ..
                })
            )
        })
        .collect();
    if !flagged.is_empty() {
        md.push_str("## Text/Voice Disagreements\n\n");
        for entry in flagged {
            if let Some(RawFeatures::Combined {
                text_score,
                voice_score,
                ..
            }) = entry.raw_features
            {
                md.push_str(&format!(
                    "- {}: text {text_score:.0}, voice {voice_score:.0}\n",
                    entry.timestamp.format("%Y-%m-%d"),
                ));
            }
        }
        md.push('\n');
    }

    Ok(md)
}

fn detail(entry: &MoodEntry) -> String {
    match &entry.raw_features {
        Some(RawFeatures::Text {
            positive_words,
            negative_words,
            ..
        }) => format!("+{} / -{} words", positive_words.len(), negative_words.len()),
        Some(RawFeatures::Voice { clarity, .. }) => format!("{clarity} voice"),
        Some(RawFeatures::Combined {
            text_score,
            voice_score,
            ..
        }) => format!("text {text_score:.0}, voice {voice_score:.0}"),
        None => String::new(),
    }
}

/// Keep free text from breaking the table.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Append a flag marker if value is below threshold (lower is worse).
fn flag_low(value: f64, threshold: f64) -> &'static str {
    if value < threshold {
        " \u{26a0}" // ⚠
    } else {
        ""
    }
}
