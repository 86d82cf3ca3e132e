use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "moodlog")]
#[command(about = "Journal check-ins scored for mood from text and voice")]
pub struct Cli {
    /// User to act for (defaults to general.default_user in the config)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score input without storing anything
    Score {
        #[command(subcommand)]
        input: ScoreCommand,
    },

    /// Score a check-in and add it to your history
    Log {
        /// Journal text
        #[arg(long)]
        text: Option<String>,

        /// Voice recording (WAV)
        #[arg(long)]
        wav: Option<PathBuf>,
    },

    /// List stored entries
    History {
        /// Only the most recent N entries
        #[arg(long)]
        last: Option<usize>,

        /// Only entries on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
    },

    /// Show the mood trend and whether a support check is due
    Trend {
        /// Number of recent entries to consider (defaults to trend.window_size)
        #[arg(long, conflicts_with = "adaptive")]
        window: Option<usize>,

        /// Pick the window in days from how volatile and frequent the entries are
        #[arg(long)]
        adaptive: bool,
    },

    /// Hide the support prompt for the configured cooldown
    Dismiss,

    /// Write a markdown report and chart to the reports directory
    Report,

    /// Trend status for every stored user
    Backfill,

    /// Show config, data, and database locations
    Paths,
}

#[derive(Subcommand)]
pub enum ScoreCommand {
    /// Score journal text
    Text {
        text: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a voice recording
    Voice {
        wav: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Combine a text score and a voice score
    Combine {
        #[arg(long)]
        text: f64,

        #[arg(long)]
        voice: f64,

        /// Confidence in the voice score, 0 to 1
        #[arg(long)]
        confidence: Option<f64>,

        #[arg(long)]
        json: bool,
    },
}
