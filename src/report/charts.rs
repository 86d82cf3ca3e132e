use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::types::{RangedCoordf64, RangedCoordusize};
use plotters::prelude::*;

use crate::config::TrendConfig;
use crate::scoring::{MAX_SCORE, MIN_SCORE};
use crate::storage::{MoodEntry, Source};

/// Chart dimensions
const WIDTH: u32 = 1200;
const HEIGHT: u32 = 500;

const COLOR_LINE: RGBColor = RGBColor(41, 128, 185); // blue
const COLOR_AVERAGE: RGBColor = RGBColor(231, 76, 60); // red
const COLOR_TEXT: RGBColor = RGBColor(52, 73, 94); // slate
const COLOR_VOICE: RGBColor = RGBColor(46, 204, 113); // green
const COLOR_COMBINED: RGBColor = RGBColor(155, 89, 182); // purple
const COLOR_THRESHOLD: RGBColor = RGBColor(200, 200, 200); // light gray

type MoodChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordusize, RangedCoordf64>>;

/// Mood score over time as a PNG.
///
/// Points are colored by source. The red line is the rolling mean over the
/// trend window; dashed lines mark the negative and stable cutoffs.
pub fn generate_mood_chart(
    user: &str,
    entries: &[MoodEntry],
    trend: &TrendConfig,
    output_path: &Path,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("Failed to fill background")?;

    let dates: Vec<String> = entries
        .iter()
        .map(|e| e.timestamp.format("%Y-%m-%d").to_string())
        .collect();
    let labels = date_labels(&dates);
    let x_range = 0..entries.len().max(1);
    let y_range = (MIN_SCORE as f64 - 0.5)..(MAX_SCORE as f64 + 0.5);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Mood over time: {user}"), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .y_labels(10)
        .x_label_formatter(&|x| {
            labels
                .iter()
                .find(|(i, _)| i == x)
                .map(|(_, l)| l.clone())
                .unwrap_or_default()
        })
        .y_desc("Mood (1-10)")
        .draw()?;

    draw_horizontal_line(&mut chart, trend.negative_below, entries.len())?;
    draw_horizontal_line(&mut chart, trend.stable_min, entries.len())?;

    let points: Vec<(usize, f64)> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (i, e.mood_score.as_f64()))
        .collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), &COLOR_LINE))?;

    for (source, color) in [
        (Source::Text, COLOR_TEXT),
        (Source::Voice, COLOR_VOICE),
        (Source::Combined, COLOR_COMBINED),
    ] {
        let series: Vec<(usize, f64)> = points
            .iter()
            .zip(entries)
            .filter(|(_, e)| e.source == source)
            .map(|(&p, _)| p)
            .collect();
        if series.is_empty() {
            continue;
        }
        chart
            .draw_series(series.iter().map(|&(x, y)| Circle::new((x, y), 5, color.filled())))?
            .label(source.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    let average = rolling_mean(&points, trend.window_size);
    if average.len() > 1 {
        chart
            .draw_series(LineSeries::new(average, &COLOR_AVERAGE))?
            .label(format!("{}-entry mean", trend.window_size))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &COLOR_AVERAGE));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present().context("Failed to write chart PNG")?;
    tracing::debug!(path = %output_path.display(), entries = entries.len(), "wrote mood chart");

    Ok(())
}

/// Trailing mean over up to `window` points ending at each index.
fn rolling_mean(points: &[(usize, f64)], window: usize) -> Vec<(usize, f64)> {
    let window = window.max(1);
    (0..points.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &points[start..=i];
            let mean = slice.iter().map(|&(_, y)| y).sum::<f64>() / slice.len() as f64;
            (points[i].0, mean)
        })
        .collect()
}

/// Helper: get x-axis labels, showing every Nth date to avoid crowding.
fn date_labels(dates: &[String]) -> Vec<(usize, String)> {
    let step = (dates.len() / 8).max(1);
    dates
        .iter()
        .enumerate()
        .filter(|(i, _)| i % step == 0 || *i == dates.len() - 1)
        .map(|(i, d)| {
            // Shorten date: "2026-02-08" → "02-08"
            let short = if d.len() >= 10 { &d[5..] } else { d.as_str() };
            (i, short.to_string())
        })
        .collect()
}

/// Draw a dashed horizontal threshold line across the chart.
fn draw_horizontal_line(chart: &mut MoodChart<'_, '_>, y_val: f64, width: usize) -> Result<()> {
    if (MIN_SCORE as f64..=MAX_SCORE as f64).contains(&y_val) {
        chart.draw_series(DashedLineSeries::new(
            vec![(0usize, y_val), (width.max(1), y_val)],
            5,
            3,
            COLOR_THRESHOLD.into(),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_is_trailing() {
        let points: Vec<(usize, f64)> = [2.0, 4.0, 6.0, 8.0].iter().copied().enumerate().collect();
        let avg = rolling_mean(&points, 2);
        assert_eq!(avg, vec![(0, 2.0), (1, 3.0), (2, 5.0), (3, 7.0)]);
    }

    #[test]
    fn rolling_mean_zero_window_is_identity() {
        let points = vec![(0, 3.0), (1, 9.0)];
        assert_eq!(rolling_mean(&points, 0), points);
    }

    #[test]
    fn date_labels_thin_out_long_ranges() {
        let dates: Vec<String> = (1..=20).map(|d| format!("2026-03-{d:02}")).collect();
        let labels = date_labels(&dates);
        assert!(labels.len() < dates.len());
        assert_eq!(labels[0], (0, "03-01".to_string()));
        assert_eq!(labels.last().unwrap(), &(19, "03-20".to_string()));
    }
}
