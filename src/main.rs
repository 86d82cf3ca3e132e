mod cli;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use console::style;

use cli::{Cli, Command, ScoreCommand};
use moodlog::checkin::{self, CheckIn};
use moodlog::config::{self, AppConfig};
use moodlog::dsp::features::FeatureConfig;
use moodlog::error::ScoringError;
use moodlog::scoring::aggregate::{self, CombinedResult};
use moodlog::scoring::text::{SentimentResult, TextScorer};
use moodlog::scoring::trend;
use moodlog::scoring::voice::{self, VoiceAnalysis, VoiceFeatures};
use moodlog::storage::{MoodRepository, SqliteRepository};
use moodlog::{audio, intervention, logging, paths, report, util};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = config::load_config()?;
    let user = cli
        .user
        .clone()
        .unwrap_or_else(|| config.general.default_user.clone());

    match cli.command {
        Command::Score { input } => score(input, &config),

        Command::Log { text, wav } => {
            let voice = wav
                .as_deref()
                .map(|p| audio::features_from_wav(p, &FeatureConfig::from(&config.audio)))
                .transpose()?;

            let checkin = CheckIn {
                user: user.clone(),
                text,
                voice,
                timestamp: Utc::now(),
            };
            let mut repo = SqliteRepository::open_default()?;
            let outcome = checkin::record(&mut repo, &checkin, &config)?;

            if let Some(s) = &outcome.scored.sentiment {
                print_sentiment(s);
            }
            if let Some(v) = &outcome.scored.voice {
                print_voice(v, None);
            }
            if let Some(c) = &outcome.scored.combined {
                print_combined(c);
            }
            println!(
                "Logged {} entry #{} for {}: {}",
                outcome.stored.source,
                outcome.stored.id,
                style(&user).cyan(),
                style(outcome.stored.mood_score).bold()
            );
            if let Some(prompt) = &outcome.prompt {
                report::print_prompt(prompt);
            }
            Ok(())
        }

        Command::History { last, since } => {
            let repo = SqliteRepository::open_default()?;
            let since = since
                .as_deref()
                .map(|d| util::resolve_date(Some(d)))
                .transpose()?;
            let entries: Vec<_> = repo
                .history(&user, last)?
                .into_iter()
                .filter(|e| since.map_or(true, |d| e.timestamp.date_naive() >= d))
                .collect();

            if entries.is_empty() {
                println!("No mood entries found for {}.", style(&user).cyan());
                return Ok(());
            }
            for e in &entries {
                println!(
                    "  {}  {:>5}  {:8}  {}",
                    e.timestamp.format("%Y-%m-%d %H:%M"),
                    e.mood_score.to_string(),
                    e.source.as_str(),
                    style(e.note.as_deref().unwrap_or("")).dim()
                );
            }
            Ok(())
        }

        Command::Trend { window, adaptive } => {
            let repo = SqliteRepository::open_default()?;
            let history = repo.history(&user, None)?;
            let status = if adaptive {
                let now = Utc::now();
                let chosen = trend::analysis_window(&history, now, &config.trend);
                let recent = trend::within_window(&history, &chosen, now);
                println!(
                    "Looking at the last {} days ({}, {} entries)",
                    chosen.days,
                    chosen.reason,
                    recent.len()
                );
                trend::evaluate_trend(recent, recent.len().max(1), &config.trend)?
            } else {
                let window = window.unwrap_or(config.trend.window_size);
                trend::evaluate_trend(&history, window, &config.trend)?
            };
            let decision = trend::intervention_check(&history, &config.intervention);

            report::print_trend(&user, &history, &status, &decision, &config);

            let last_dismissal = repo.last_dismissal(&user)?;
            if let Some(prompt) =
                intervention::prompt_for(&decision, last_dismissal, Utc::now(), &config.intervention)
            {
                report::print_prompt(&prompt);
            }
            Ok(())
        }

        Command::Dismiss => {
            let mut repo = SqliteRepository::open_default()?;
            repo.record_dismissal(&user, Utc::now())?;
            println!(
                "Support prompts hidden for {} hours.",
                config.intervention.cooldown_hours
            );
            Ok(())
        }

        Command::Report => {
            let repo = SqliteRepository::open_default()?;
            report::generate_full_report(&repo, &user, &config)?;
            Ok(())
        }

        Command::Backfill => {
            let repo = SqliteRepository::open_default()?;
            let summaries = report::backfill_all(&repo, &config)?;
            report::print_backfill(&summaries);
            Ok(())
        }

        Command::Paths => {
            println!("  {:10} {}", "Config", paths::config_file().display());
            println!("  {:10} {}", "Data", paths::data_dir().display());
            println!("  {:10} {}", "Database", paths::db_path().display());
            println!("  {:10} {}", "Reports", paths::reports_dir().display());
            Ok(())
        }
    }
}

fn score(input: ScoreCommand, config: &AppConfig) -> Result<()> {
    match input {
        ScoreCommand::Text { text, json } => {
            let result = TextScorer::new(&config.text).score(&text);
            if json {
                return print_json(&result);
            }
            print_sentiment(&result);
        }

        ScoreCommand::Voice { wav, json } => {
            let features = audio::features_from_wav(&wav, &FeatureConfig::from(&config.audio))?;
            let analysis = voice::score_voice(features.as_ref(), &config.voice)
                .ok_or(ScoringError::MissingFeatures)
                .with_context(|| format!("Cannot score {}", wav.display()))?;
            if json {
                return print_json(&serde_json::json!({
                    "features": features,
                    "analysis": analysis,
                }));
            }
            print_voice(&analysis, features.as_ref());
        }

        ScoreCommand::Combine {
            text,
            voice,
            confidence,
            json,
        } => {
            let result = match confidence {
                Some(c) => aggregate::combine_with_confidence(text, voice, c, &config.aggregator)?,
                None => aggregate::combine(text, voice, &config.aggregator)?,
            };
            if json {
                return print_json(&result);
            }
            print_combined(&result);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{out}");
    Ok(())
}

fn print_sentiment(result: &SentimentResult) {
    println!("{}", style("Text").bold());
    println!("  {:16} {}", "Score", style(result.score).bold());
    if !result.positive_words.is_empty() {
        let words: Vec<&str> = result.positive_words.iter().map(String::as_str).collect();
        println!("  {:16} {}", "Positive", style(words.join(", ")).green());
    }
    if !result.negative_words.is_empty() {
        let words: Vec<&str> = result.negative_words.iter().map(String::as_str).collect();
        println!("  {:16} {}", "Negative", style(words.join(", ")).red());
    }
    if result.negation_adjustments > 0 {
        println!("  {:16} {}", "Negations", result.negation_adjustments);
    }
}

fn print_voice(analysis: &VoiceAnalysis, features: Option<&VoiceFeatures>) {
    println!("{}", style("Voice").bold());
    println!("  {:16} {}", "Score", style(analysis.score).bold());
    println!("  {:16} {:.1}", "Energy", analysis.energy_score);
    println!("  {:16} {:.1}", "Steadiness", analysis.clarity_score);
    println!("  {:16} {}", "Clarity", analysis.clarity);
    if let Some(f) = features {
        println!(
            "  {}",
            style(format!(
                "energy {:.4}  rms {:.3}  zcr {:.1}  centroid {:.0} Hz",
                f.energy, f.rms, f.zero_crossing_rate, f.spectral_centroid
            ))
            .dim()
        );
    }
}

fn print_combined(result: &CombinedResult) {
    println!("{}", style("Combined").bold());
    println!(
        "  {:16} {:.1} ({})",
        "Score", result.final_score, result.category
    );
    println!(
        "  {:16} text {:.2} / voice {:.2}",
        "Weights", result.text_weight, result.voice_weight
    );
    let d = &result.discrepancy;
    let level = format!("{:?} ({:.1})", d.level, d.magnitude).to_lowercase();
    println!("  {:16} {}", "Discrepancy", level);
    if let Some(note) = d.interpretation() {
        println!("  {}", style(note).yellow());
    }
}
