pub mod charts;
pub mod compare;
pub mod markdown;

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use crate::config::AppConfig;
use crate::intervention::SupportPrompt;
use crate::paths;
use crate::scoring::trend::{self, InterventionDecision, TrendClass, TrendStatus};
use crate::storage::{MoodEntry, MoodRepository};
use compare::WindowComparison;

/// Where a full report was written.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub chart: PathBuf,
    pub markdown: PathBuf,
}

/// Generate the full report (chart PNG + markdown) for one user's history.
///
/// Returns None when the user has no entries yet.
pub fn generate_full_report(
    repo: &dyn MoodRepository,
    user: &str,
    config: &AppConfig,
) -> Result<Option<ReportFiles>> {
    let entries = repo.history(user, None)?;
    if entries.is_empty() {
        println!("No mood entries found for {}.", style(user).cyan());
        return Ok(None);
    }

    let today = chrono::Local::now().date_naive();
    let chart_path = paths::report_path(user, &today, "png");
    charts::generate_mood_chart(user, &entries, &config.trend, &chart_path)?;
    println!("Chart saved to {}", style(chart_path.display()).green());

    let md = markdown::generate_report(user, &entries, config)?;
    let md_path = paths::report_path(user, &today, "md");
    std::fs::write(&md_path, &md)
        .with_context(|| format!("Failed to write report: {}", md_path.display()))?;
    println!("Report saved to {}", style(md_path.display()).green());

    Ok(Some(ReportFiles {
        chart: chart_path,
        markdown: md_path,
    }))
}

/// Print a trend status, the intervention signal, and the window comparison.
pub fn print_trend(
    user: &str,
    history: &[MoodEntry],
    status: &TrendStatus,
    decision: &InterventionDecision,
    config: &AppConfig,
) {
    println!("{}", style(format!("=== Mood Trend: {user} ===")).bold());
    println!();

    if let Some(message) = &status.message {
        println!("  {}", style(message).dim());
        return;
    }

    let class = match status.classification {
        TrendClass::Stable => style(status.classification.to_string()).green(),
        TrendClass::Fluctuating => style(status.classification.to_string()).yellow(),
        TrendClass::Negative => style(status.classification.to_string()).red(),
    };
    println!("  {:16} {}", "Classification", class);
    if let Some(avg) = status.average_score {
        println!("  {:16} {avg:.1}/10 over {} entries", "Average", status.window_size);
    }
    println!("  {:16} {}", "Direction", status.direction);

    if let Some(cmp) = trend_comparison(history, status) {
        compare::print_comparison(&cmp);
    }

    println!();
    if decision.considered == 0 {
        println!(
            "  {}",
            style(format!(
                "Support check needs at least {} entries.",
                config.intervention.min_entries
            ))
            .dim()
        );
    } else if decision.intervene {
        println!("  {}", style("Support check: recent entries suggest reaching out.").yellow());
    } else {
        println!("  {}", style("Support check: nothing of concern.").dim());
    }
}

/// Latest window against the one before it, sized by the entries the status
/// actually covered.
pub fn trend_comparison(history: &[MoodEntry], status: &TrendStatus) -> Option<WindowComparison> {
    compare::compare_windows(history, status.window_size)
}

/// Print a supportive prompt.
pub fn print_prompt(prompt: &SupportPrompt) {
    println!();
    println!("{}", style(&prompt.headline).yellow().bold());
    for suggestion in prompt.suggestions {
        println!("  • {suggestion}");
    }
    println!(
        "  {}",
        style("Run `moodlog dismiss` to hide this for a while.").dim()
    );
}

/// Trend status for one user, as computed by `backfill`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub user: String,
    pub entries: usize,
    pub status: TrendStatus,
    pub decision: InterventionDecision,
}

/// Evaluate every user's history in parallel.
///
/// Histories are independent, so each gets its own scoped thread. Results
/// come back in input order.
pub fn backfill(histories: Vec<(String, Vec<MoodEntry>)>, config: &AppConfig) -> Result<Vec<UserSummary>> {
    let results: Vec<Result<UserSummary>> = std::thread::scope(|s| {
        let handles: Vec<_> = histories
            .into_iter()
            .map(|(user, history)| {
                s.spawn(move || -> Result<UserSummary> {
                    let status =
                        trend::evaluate_trend(&history, config.trend.window_size, &config.trend)
                            .with_context(|| format!("Failed to evaluate trend for {user}"))?;
                    let decision = trend::intervention_check(&history, &config.intervention);
                    Ok(UserSummary {
                        entries: history.len(),
                        user,
                        status,
                        decision,
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("trend worker panicked")))
            })
            .collect()
    });

    let summaries = results.into_iter().collect::<Result<Vec<_>>>()?;
    tracing::info!(users = summaries.len(), "backfilled trend status");
    Ok(summaries)
}

/// Load every stored user's history, then run `backfill` over them.
pub fn backfill_all(repo: &dyn MoodRepository, config: &AppConfig) -> Result<Vec<UserSummary>> {
    let histories = repo
        .users()?
        .into_iter()
        .map(|user| {
            let history = repo.history(&user, None)?;
            Ok((user, history))
        })
        .collect::<Result<Vec<_>>>()?;
    backfill(histories, config)
}

/// One line per user.
pub fn print_backfill(summaries: &[UserSummary]) {
    if summaries.is_empty() {
        println!("No users with mood entries.");
        return;
    }
    for s in summaries {
        let avg = s
            .status
            .average_score
            .map(|a| format!("{a:.1}"))
            .unwrap_or_else(|| "-".into());
        let flag = if s.decision.intervene {
            style("needs support").red().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:16} {:>4} entries  avg {:>4}  {:12} {}",
            s.user,
            s.entries,
            avg,
            s.status.classification.to_string(),
            flag
        );
    }
}
