//! Capture cadence inference.

use chrono::NaiveDateTime;
use statrs::statistics::{Data, Median};

/// Estimate the nominal capture interval in whole minutes.
///
/// Uses the median of the positive gaps between consecutive frames, rounded
/// to the nearest minute and floored at 1. With fewer than two frames (or no
/// positive gap) the fallback is used.
pub fn infer_capture_interval(times: &[NaiveDateTime], fallback_minutes: i64) -> i64 {
    let fallback = fallback_minutes.max(1);
    if times.len() < 2 {
        return fallback;
    }

    let deltas: Vec<f64> = times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 60.0)
        .filter(|&delta| delta > 0.0)
        .collect();

    if deltas.is_empty() {
        return fallback;
    }

    let median = Data::new(deltas).median();
    (median.round() as i64).max(1)
}
