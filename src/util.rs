use chrono::NaiveDate;

/// Resolve a date string to a NaiveDate, defaulting to today.
pub fn resolve_date(date: Option<&str>) -> anyhow::Result<NaiveDate> {
    match date {
        Some(s) => Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Arithmetic mean, or None for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Round to a fixed number of decimal places (half away from zero).
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Round to the nearest integer after snapping away accumulated float error,
/// so 5.0 - 3 * 0.5 lands on 3.5 and rounds up like the exact value would.
pub fn round_score(value: f64) -> f64 {
    round_to(value, 6).round()
}

/// Root-mean-square of a block of samples. Zero for an empty block.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
