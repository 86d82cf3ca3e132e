use console::style;
use serde::Serialize;

use crate::storage::MoodEntry;
use crate::util;

/// The latest trend window against the one right before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowComparison {
    pub previous_mean: f64,
    pub current_mean: f64,
    pub previous_len: usize,
    pub current_len: usize,
}

impl WindowComparison {
    pub fn delta(&self) -> f64 {
        self.current_mean - self.previous_mean
    }
}

/// Compare the newest `window` entries with the `window` before them.
///
/// History is oldest-first. None unless both windows have at least one entry.
pub fn compare_windows(history: &[MoodEntry], window: usize) -> Option<WindowComparison> {
    if window == 0 || history.len() <= window {
        return None;
    }
    let split = history.len() - window;
    let prev_start = split.saturating_sub(window);

    let scores = |slice: &[MoodEntry]| -> Vec<f64> { slice.iter().map(|e| e.mood_score.as_f64()).collect() };
    let previous = scores(&history[prev_start..split]);
    let current = scores(&history[split..]);

    Some(WindowComparison {
        previous_mean: util::mean(&previous)?,
        current_mean: util::mean(&current)?,
        previous_len: previous.len(),
        current_len: current.len(),
    })
}

/// Print a comparison line. Green when mood went up, red when it went down.
pub fn print_comparison(cmp: &WindowComparison) {
    let delta = cmp.delta();
    let arrow = if delta.abs() < 0.05 {
        style("=").dim().to_string()
    } else if delta > 0.0 {
        style(format!("{delta:+.1}")).green().to_string()
    } else {
        style(format!("{delta:+.1}")).red().to_string()
    };

    println!(
        "  {:16} {:>5.1} ({} entries) → {:>5.1} ({} entries)  {}",
        "Previous window",
        cmp.previous_mean,
        cmp.previous_len,
        cmp.current_mean,
        cmp.current_len,
        arrow
    );
}
