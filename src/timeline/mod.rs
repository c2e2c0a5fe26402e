//! Activity timeline segmentation.
//!
//! This module contains:
//! - Capture interval inference
//! - Segment building from runs of frames
//! - Idle detection and carving
//! - Normalization into the final, id-stamped timeline

pub mod builder;
pub mod document;
pub mod idle;
pub mod interval;
pub mod normalize;
pub mod segment;

pub use builder::{build_segments, group_runs};
pub use document::{human_line, Timeline, TIMELINE_SCHEMA_VERSION};
pub use idle::{carve, find_idle_intervals, image_similarity, IdleInterval};
pub use interval::infer_capture_interval;
pub use normalize::normalize_segments;
pub use segment::{minute_of_day, RiskFlag, Segment, TimedSegment};

use crate::config::TimelineConfig;
use crate::frames::{FrameResult, FrameStore};

/// Output of segmenting one day's frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub inferred_interval_minutes: i64,
    pub segments: Vec<Segment>,
    /// Idle intervals that were carved, in scan order
    pub idle_intervals: Vec<IdleInterval>,
}

/// Turn a day's sorted frames into a non-overlapping timeline.
pub fn segment_day(
    frames: &[FrameResult],
    store: &dyn FrameStore,
    config: &TimelineConfig,
) -> Segmentation {
    let times: Vec<_> = frames.iter().map(|f| f.timestamp).collect();
    let inferred_interval_minutes =
        infer_capture_interval(&times, config.capture_interval_fallback_minutes);

    if frames.is_empty() {
        return Segmentation {
            inferred_interval_minutes,
            segments: Vec::new(),
            idle_intervals: Vec::new(),
        };
    }

    let provisional = build_segments(
        frames,
        inferred_interval_minutes,
        config.low_confidence_threshold,
    );
    let idle_intervals = find_idle_intervals(frames, store, config);
    let (carved, idle) = carve(provisional, &idle_intervals);
    let segments = normalize_segments(carved, idle);

    tracing::debug!(
        "Segmented {} frames into {} segments ({} idle, interval {} min)",
        frames.len(),
        segments.len(),
        idle_intervals.len(),
        inferred_interval_minutes
    );

    Segmentation {
        inferred_interval_minutes,
        segments,
        idle_intervals,
    }
}
