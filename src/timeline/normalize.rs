//! Final ordering, filtering and id assignment for timeline segments.

use crate::timeline::segment::{Segment, TimedSegment};

/// Merge carved fragments with Idle segments into the final timeline.
///
/// Entries are sorted by start (stable, so fragments precede Idle segments
/// with the same start), anything that rounds to zero minutes is dropped,
/// and ids `S001, S002, ...` are assigned in the resulting order.
pub fn normalize_segments(carved: Vec<TimedSegment>, idle: Vec<TimedSegment>) -> Vec<Segment> {
    let mut all = carved;
    all.extend(idle);
    all.sort_by_key(|segment| segment.start);

    all.into_iter()
        .filter(|segment| segment.rounded_minutes() > 0)
        .enumerate()
        .map(|(idx, segment)| finalize(idx + 1, segment))
        .collect()
}

fn finalize(seq: usize, segment: TimedSegment) -> Segment {
    let duration_minutes = segment.rounded_minutes();
    Segment {
        id: format!("S{seq:03}"),
        start: segment.start.time(),
        end: segment.end.time(),
        duration_minutes,
        dominant_surface: segment.dominant_surface,
        activity: segment.activity,
        context_detail: segment.context_detail,
        confidence: segment.confidence,
        supporting_surfaces: segment.supporting_surfaces,
        evidence_frame_ids: segment.evidence_frame_ids,
        notes: segment.notes,
        risk_flags: segment.risk_flags,
        is_work: None,
        project_id: None,
    }
}
