//! Idle detection and carving.
//!
//! Two adjacent captures that are far apart in time yet show an essentially
//! unchanged screen mean the user was away. The stretch between them (minus a
//! small margin around each capture) is cut out of the provisional segments
//! and replaced by an explicit Idle segment.

use crate::config::TimelineConfig;
use crate::frames::{FrameResult, FrameStore};
use crate::timeline::segment::{RiskFlag, TimedSegment};
use chrono::{Duration, NaiveDateTime};
use image::imageops::FilterType;
use image::GrayImage;

/// Side length of the grayscale grid screenshots are compared on.
pub const SIMILARITY_GRID: u32 = 64;

/// Label used for both surface and activity of carved segments.
pub const IDLE_LABEL: &str = "Idle";

/// Confidence assigned to carved Idle segments.
pub const IDLE_CONFIDENCE: f64 = 0.6;

/// A stretch of time judged idle, pending insertion into the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub similarity: f64,
}

impl IdleInterval {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The synthetic segment covering exactly this interval.
    pub fn to_segment(&self) -> TimedSegment {
        TimedSegment {
            start: self.start,
            end: self.end,
            dominant_surface: IDLE_LABEL.to_string(),
            activity: IDLE_LABEL.to_string(),
            context_detail: "No visible screen change between captures".to_string(),
            confidence: IDLE_CONFIDENCE,
            supporting_surfaces: Vec::new(),
            evidence_frame_ids: Vec::new(),
            notes: format!("Idle detected (similarity {:.3})", self.similarity),
            risk_flags: vec![RiskFlag::IdleDetected],
        }
    }
}

/// Visual similarity of two encoded screenshots in [0, 1].
///
/// Both images are converted to grayscale and resized to a
/// `SIMILARITY_GRID`² grid; similarity is one minus the mean absolute pixel
/// difference over 255. Undecodable input yields 0.0, which never counts as idle.
pub fn image_similarity(a: &[u8], b: &[u8]) -> f64 {
    let (Some(a), Some(b)) = (downsample(a), downsample(b)) else {
        return 0.0;
    };

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    let mean_diff = total as f64 / a.as_raw().len() as f64;

    (1.0 - mean_diff / 255.0).clamp(0.0, 1.0)
}

fn downsample(bytes: &[u8]) -> Option<GrayImage> {
    let gray = image::load_from_memory(bytes).ok()?.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return None;
    }
    Some(image::imageops::resize(
        &gray,
        SIMILARITY_GRID,
        SIMILARITY_GRID,
        FilterType::Triangle,
    ))
}

/// Similarity of two frames' screenshots, absorbing read failures as 0.0.
fn frame_similarity(store: &dyn FrameStore, a: &FrameResult, b: &FrameResult) -> f64 {
    let read = |frame: &FrameResult| match store.read_image(&frame.evidence_id) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!("Could not read {}: {}", frame.evidence_id, e);
            None
        }
    };

    match (read(a), read(b)) {
        (Some(x), Some(y)) => image_similarity(&x, &y),
        _ => 0.0,
    }
}

/// Scan every adjacent frame pair of the day for idle stretches.
pub fn find_idle_intervals(
    frames: &[FrameResult],
    store: &dyn FrameStore,
    config: &TimelineConfig,
) -> Vec<IdleInterval> {
    let min_gap = Duration::minutes(config.idle_gap_minutes);
    let max_margin = Duration::minutes(config.idle_margin_minutes);

    let mut intervals = Vec::new();
    for pair in frames.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let gap = b.timestamp - a.timestamp;
        if gap < min_gap {
            continue;
        }

        let similarity = frame_similarity(store, a, b);
        if similarity < config.idle_similarity_threshold {
            continue;
        }

        let margin = max_margin.min(gap / 4);
        let interval = IdleInterval {
            start: a.timestamp + margin,
            end: b.timestamp - margin,
            similarity,
        };
        if interval.end > interval.start {
            tracing::debug!(
                "Idle between {} and {} (similarity {:.3})",
                interval.start,
                interval.end,
                similarity
            );
            intervals.push(interval);
        }
    }

    intervals
}

/// Remove `[cut_start, cut_end)` from a segment, keeping any non-empty remainders.
pub fn subtract_interval(
    segment: TimedSegment,
    cut_start: NaiveDateTime,
    cut_end: NaiveDateTime,
) -> Vec<TimedSegment> {
    if !segment.overlaps(cut_start, cut_end) {
        return vec![segment];
    }

    let mut remainders = Vec::with_capacity(2);
    if cut_start > segment.start {
        let mut left = segment.clone();
        left.end = cut_start;
        remainders.push(left);
    }
    if cut_end < segment.end {
        let mut right = segment;
        right.start = cut_end;
        remainders.push(right);
    }
    remainders
}

/// Carve every idle interval out of the provisional segments.
///
/// Returns the surviving fragments and the inserted Idle segments, unsorted.
pub fn carve(
    segments: Vec<TimedSegment>,
    intervals: &[IdleInterval],
) -> (Vec<TimedSegment>, Vec<TimedSegment>) {
    let mut carved = segments;
    let mut idle = Vec::with_capacity(intervals.len());

    for interval in intervals {
        carved = carved
            .into_iter()
            .flat_map(|segment| subtract_interval(segment, interval.start, interval.end))
            .collect();
        idle.push(interval.to_segment());
    }

    (carved, idle)
}
