//! Provisional segments from runs of identically classified frames.
//!
//! Boundaries between runs sit at the midpoint of the two frames on either
//! side of a classification change. The final run is extrapolated forward by
//! one inferred capture interval.

use crate::frames::{FrameResult, MAX_SUPPORTING_SURFACES};
use crate::timeline::segment::{RiskFlag, TimedSegment};
use chrono::{Duration, NaiveDateTime};
use std::ops::Range;

/// Group consecutive frames sharing a `(dominant_surface, activity)` bucket.
///
/// Returns index ranges into `frames`; runs are maximal and cover every frame.
pub fn group_runs(frames: &[FrameResult]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for (idx, frame) in frames.iter().enumerate() {
        match &mut current {
            Some(run) if frames[run.start].bucket() == frame.bucket() => {
                run.end = idx + 1;
            }
            _ => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                current = Some(idx..idx + 1);
            }
        }
    }

    if let Some(run) = current {
        runs.push(run);
    }

    runs
}

/// Build contiguous provisional segments covering
/// `[first frame, last frame + interval]`.
pub fn build_segments(
    frames: &[FrameResult],
    interval_minutes: i64,
    low_confidence_threshold: f64,
) -> Vec<TimedSegment> {
    let Some(last) = frames.last() else {
        return Vec::new();
    };
    let last_idx = frames.len() - 1;

    group_runs(frames)
        .into_iter()
        .map(|run| {
            let start = if run.start == 0 {
                frames[0].timestamp
            } else {
                midpoint(frames[run.start - 1].timestamp, frames[run.start].timestamp)
            };

            let end_idx = run.end - 1;
            let end = if end_idx < last_idx {
                midpoint(frames[end_idx].timestamp, frames[end_idx + 1].timestamp)
            } else {
                last.timestamp + Duration::minutes(interval_minutes)
            };

            summarize_run(&frames[run], start, end, low_confidence_threshold)
        })
        .collect()
}

/// Halfway point between two instants.
pub fn midpoint(a: NaiveDateTime, b: NaiveDateTime) -> NaiveDateTime {
    a + (b - a) / 2
}

fn summarize_run(
    chunk: &[FrameResult],
    start: NaiveDateTime,
    end: NaiveDateTime,
    low_confidence_threshold: f64,
) -> TimedSegment {
    let first = &chunk[0];

    let mut supporting: Vec<String> = Vec::new();
    for frame in chunk {
        for surface in &frame.supporting_surfaces {
            if surface != &first.dominant_surface && !supporting.contains(surface) {
                supporting.push(surface.clone());
            }
        }
    }
    supporting.truncate(MAX_SUPPORTING_SURFACES);

    let mean_confidence =
        chunk.iter().map(|f| f.confidence).sum::<f64>() / chunk.len() as f64;

    let risk_flag = if mean_confidence < low_confidence_threshold {
        RiskFlag::LowConfidence
    } else {
        RiskFlag::None
    };

    TimedSegment {
        start,
        end,
        dominant_surface: first.dominant_surface.clone(),
        activity: first.activity.clone(),
        context_detail: first.context_detail.clone(),
        confidence: round3(mean_confidence),
        supporting_surfaces: supporting,
        evidence_frame_ids: chunk.iter().map(|f| f.evidence_id.clone()).collect(),
        notes: first.notes.clone(),
        risk_flags: vec![risk_flag],
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn frame(h: u32, m: u32, surface: &str, activity: &str, confidence: f64) -> FrameResult {
        FrameResult {
            timestamp: at(h, m),
            evidence_id: format!("{h:02}-{m:02}-00.png"),
            dominant_surface: surface.to_string(),
            activity: activity.to_string(),
            confidence,
            supporting_surfaces: vec![],
            context_detail: format!("ctx {h}:{m}"),
            notes: String::new(),
        }
    }

    #[test]
    fn test_group_runs() {
        let frames = vec![
            frame(8, 0, "VS Code", "Coding", 0.9),
            frame(8, 15, "VS Code", "Coding", 0.9),
            frame(8, 30, "YouTube", "Video", 0.9),
            frame(8, 45, "VS Code", "Coding", 0.9),
        ];
        assert_eq!(group_runs(&frames), vec![0..2, 2..3, 3..4]);
        assert!(group_runs(&[]).is_empty());
    }

    #[test]
    fn test_same_surface_different_activity_splits() {
        let frames = vec![
            frame(8, 0, "Chrome", "Browsing", 0.9),
            frame(8, 15, "Chrome", "Email", 0.9),
        ];
        assert_eq!(group_runs(&frames).len(), 2);
    }

    #[test]
    fn test_midpoint_boundaries_are_contiguous() {
        let frames = vec![
            frame(8, 0, "VS Code", "Coding", 0.9),
            frame(8, 15, "VS Code", "Coding", 0.8),
            frame(8, 30, "YouTube", "Video", 0.5),
            frame(8, 45, "Slack", "Messaging", 0.7),
            frame(9, 0, "Slack", "Messaging", 0.7),
        ];
        let segments = build_segments(&frames, 15, 0.6);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start, at(8, 0));
        assert_eq!(segments[0].end, at(8, 22) + Duration::seconds(30));
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(segments[2].end, at(9, 15));
    }

    #[test]
    fn test_run_aggregates() {
        let mut a = frame(8, 0, "VS Code", "Coding", 0.5);
        a.supporting_surfaces = vec!["Terminal".to_string(), "VS Code".to_string()];
        let mut b = frame(8, 15, "VS Code", "Coding", 0.6);
        b.supporting_surfaces = vec![
            "Terminal".to_string(),
            "Chrome".to_string(),
            "Slack".to_string(),
            "Figma".to_string(),
        ];
        let c = frame(8, 30, "VS Code", "Coding", 0.6);

        let segments = build_segments(&[a, b, c], 15, 0.6);
        let seg = &segments[0];
        assert_eq!(seg.confidence, 0.567);
        assert_eq!(seg.risk_flags, vec![RiskFlag::LowConfidence]);
        assert_eq!(seg.supporting_surfaces, vec!["Terminal", "Chrome", "Slack"]);
        assert_eq!(
            seg.evidence_frame_ids,
            vec!["08-00-00.png", "08-15-00.png", "08-30-00.png"]
        );
        assert_eq!(seg.context_detail, "ctx 8:0");
    }

    #[test]
    fn test_single_frame_uses_interval() {
        let segments = build_segments(&[frame(10, 0, "Notion", "Writing/Reading", 0.9)], 15, 0.6);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].rounded_minutes(), 15);
        assert_eq!(segments[0].risk_flags, vec![RiskFlag::None]);
    }
}
