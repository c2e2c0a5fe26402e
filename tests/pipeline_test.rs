//! End-to-end tests for the focus-nudge pipeline

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use focus_nudge::frames::{self, FrameStore, MemoryFrameStore};
use focus_nudge::timeline::idle::IDLE_LABEL;
use focus_nudge::{Config, Engine, FrameError, FrameResult, PipelineError, RiskFlag, TriggerType};
use image::{GrayImage, ImageFormat, Luma};
use std::cell::Cell;
use std::io::{self, Cursor};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    date().and_hms_opt(h, m, 0).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn frame(h: u32, m: u32, surface: &str, activity: &str) -> FrameResult {
    FrameResult {
        timestamp: at(h, m),
        evidence_id: format!("{h:02}-{m:02}-00.png"),
        dominant_surface: surface.to_string(),
        activity: activity.to_string(),
        confidence: 0.9,
        supporting_surfaces: vec![],
        context_detail: String::new(),
        notes: String::new(),
    }
}

fn png(shade: u8) -> Vec<u8> {
    let img = GrayImage::from_pixel(48, 32, Luma([shade]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn store_with(frames: &[FrameResult], shade: u8) -> MemoryFrameStore {
    let mut store = MemoryFrameStore::new();
    for f in frames {
        store.insert(f.evidence_id.clone(), png(shade));
    }
    store
}

fn engine() -> Engine {
    Engine::new(Config::default()).unwrap()
}

fn video_gap_day() -> Vec<FrameResult> {
    vec![
        frame(8, 0, "YouTube", "Video"),
        frame(8, 15, "YouTube", "Video"),
        frame(9, 10, "YouTube", "Video"),
    ]
}

/// Counts image reads so tests can assert nothing was scanned.
struct CountingStore {
    reads: Cell<usize>,
}

impl FrameStore for CountingStore {
    fn read_image(&self, _evidence_id: &str) -> io::Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        Ok(png(10))
    }
}

#[test]
fn test_idle_gap_is_carved() {
    let frames = video_gap_day();
    let store = store_with(&frames, 120);

    let timeline = engine().build_timeline(date(), &frames, &store).unwrap();
    let segments = &timeline.segments;

    // deltas 15 and 55 -> interval 35, day spans 08:00..09:45
    assert_eq!(timeline.inferred_interval_minutes, 35);
    assert_eq!(segments.len(), 3);

    assert_eq!(segments[0].activity, "Video");
    assert_eq!((segments[0].start, segments[0].end), (hm(8, 0), hm(8, 20)));

    assert_eq!(segments[1].activity, IDLE_LABEL);
    assert_eq!(segments[1].dominant_surface, IDLE_LABEL);
    assert_eq!((segments[1].start, segments[1].end), (hm(8, 20), hm(9, 5)));
    assert_eq!(segments[1].duration_minutes, 45);
    assert_eq!(segments[1].confidence, 0.6);
    assert_eq!(segments[1].risk_flags, vec![RiskFlag::IdleDetected]);
    assert!(segments[1].evidence_frame_ids.is_empty());

    assert_eq!(segments[2].activity, "Video");
    assert_eq!((segments[2].start, segments[2].end), (hm(9, 5), hm(9, 45)));

    let ids: Vec<&str> = segments.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["S001", "S002", "S003"]);
    assert_eq!(
        timeline.timeline_human_readable[1],
        "08:20-09:05  Idle  | Idle (confidence: 0.60)"
    );
}

#[test]
fn test_segments_sorted_and_cover_span() {
    let frames = vec![
        frame(8, 0, "VS Code", "Coding"),
        frame(8, 10, "VS Code", "Coding"),
        frame(8, 20, "Slack", "Chat"),
        frame(8, 30, "Slack", "Chat"),
        frame(9, 30, "Slack", "Chat"),
        frame(9, 40, "VS Code", "Coding"),
    ];
    let store = store_with(&frames, 200);

    let timeline = engine().build_timeline(date(), &frames, &store).unwrap();
    let segments = &timeline.segments;
    assert!(segments.iter().any(|s| s.activity == IDLE_LABEL));

    for pair in segments.windows(2) {
        assert!(pair[0].start_minute() <= pair[1].start_minute());
        assert!(pair[0].end_minute() <= pair[1].start_minute());
    }

    // first frame .. last frame + interval (10)
    let span = (9 * 60 + 50) - (8 * 60);
    let total: i64 = segments.iter().map(|s| s.duration_minutes).sum();
    assert!((total - span).abs() <= segments.len() as i64);
    assert_eq!(segments.first().unwrap().start, hm(8, 0));
    assert_eq!(segments.last().unwrap().end, hm(9, 50));
}

#[test]
fn test_single_frame_uses_fallback_interval() {
    let frames = vec![frame(10, 0, "Docs", "Writing/Reading")];
    let timeline = engine()
        .build_timeline(date(), &frames, &MemoryFrameStore::new())
        .unwrap();

    assert_eq!(timeline.inferred_interval_minutes, 15);
    assert_eq!(timeline.segments.len(), 1);
    assert_eq!(timeline.segments[0].end, hm(10, 15));
    assert_eq!(timeline.segments[0].duration_minutes, 15);
}

#[test]
fn test_unreadable_image_is_never_idle() {
    let frames = video_gap_day();
    let mut store = store_with(&frames, 120);
    store.insert(frames[2].evidence_id.clone(), b"not a png".to_vec());

    let timeline = engine().build_timeline(date(), &frames, &store).unwrap();
    assert_eq!(timeline.segments.len(), 1);
    assert_eq!(timeline.segments[0].start, hm(8, 0));
    assert_eq!(timeline.segments[0].end, hm(9, 45));

    // Missing image bytes behave the same way
    let timeline = engine()
        .build_timeline(date(), &frames, &MemoryFrameStore::new())
        .unwrap();
    assert!(timeline.segments.iter().all(|s| s.activity != IDLE_LABEL));
}

#[test]
fn test_changed_screen_is_not_idle() {
    let frames = video_gap_day();
    let mut store = store_with(&frames, 0);
    store.insert(frames[2].evidence_id.clone(), png(255));

    let timeline = engine().build_timeline(date(), &frames, &store).unwrap();
    assert_eq!(timeline.idle_minutes(), 0);
}

#[test]
fn test_return_to_work_and_focus_through_engine() {
    let frames = vec![
        frame(8, 0, "VS Code", "Coding"),
        frame(8, 10, "VS Code", "Coding"),
        frame(8, 20, "YouTube", "Video"),
        frame(8, 30, "YouTube", "Video"),
        frame(8, 40, "VS Code", "Coding"),
        frame(8, 50, "VS Code", "Coding"),
    ];
    let report = engine()
        .run(date(), &frames, &MemoryFrameStore::new())
        .unwrap();

    // S001 Coding 08:00-08:15, S002 Video 08:15-08:35, S003 Coding 08:35-09:00
    let durations: Vec<i64> = report
        .timeline
        .segments
        .iter()
        .map(|s| s.duration_minutes)
        .collect();
    assert_eq!(durations, vec![15, 20, 25]);

    let events = &report.feedback.feedback_events;
    let summary: Vec<(&str, i64)> = events
        .iter()
        .map(|e| (e.event_id.as_str(), e.time_minute_of_day))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("firstwork_S001", 480),
            ("focus_S001_L1", 495),
            ("return_S003", 515),
            ("focus_S003_L2", 540),
        ]
    );

    let ret = &events[2];
    assert_eq!(ret.trigger_type, TriggerType::ReturnToWork);
    assert_eq!(ret.time_local, "08:35");
    assert_eq!(ret.evidence_segment_ids, vec!["S002", "S003"]);
    assert!(ret.message.contains("20 minutes"));

    assert_eq!(report.feedback.capture_interval_minutes, 10);
    assert_eq!(report.feedback.timezone, report.timeline.timezone);
}

#[test]
fn test_anomaly_fires_once_then_resets() {
    let frames: Vec<FrameResult> = (0..12)
        .map(|i| {
            let minute = 8 * 60 + i * 10;
            let (h, m) = ((minute / 60) as u32, (minute % 60) as u32);
            if i % 2 == 0 {
                frame(h, m, "VS Code", "Coding")
            } else {
                frame(h, m, "YouTube", "Video")
            }
        })
        .collect();

    let report = engine()
        .run(date(), &frames, &MemoryFrameStore::new())
        .unwrap();
    assert_eq!(report.timeline.segments.len(), 12);

    let anomalies: Vec<_> = report
        .feedback
        .feedback_events
        .iter()
        .filter(|e| e.trigger_type == TriggerType::Anomaly)
        .collect();
    assert_eq!(anomalies.len(), 1);

    // Window 08:00..09:05 closes at S007 with six switches
    let anomaly = anomalies[0];
    assert_eq!(anomaly.event_id, "anomaly_S007");
    assert_eq!(anomaly.time_minute_of_day, 545);
    assert_eq!(anomaly.evidence_segment_ids.len(), 7);
    assert!(anomaly.message.starts_with("6 switches"));
}

#[test]
fn test_runs_are_deterministic() {
    let frames = vec![
        frame(8, 0, "VS Code", "Coding"),
        frame(8, 15, "VS Code", "Coding"),
        frame(8, 30, "VS Code", "Coding"),
        frame(8, 45, "Browser", "Browsing"),
        frame(9, 40, "Browser", "Browsing"),
        frame(9, 55, "VS Code", "Coding"),
        frame(10, 10, "VS Code", "Coding"),
        frame(10, 25, "VS Code", "Coding"),
    ];
    let store = store_with(&frames, 90);

    let first = engine().run(date(), &frames, &store).unwrap();
    let second = engine().run(date(), &frames, &store).unwrap();

    assert_eq!(
        first.timeline.to_json().unwrap(),
        second.timeline.to_json().unwrap()
    );
    assert_eq!(
        first.feedback.to_json().unwrap(),
        second.feedback.to_json().unwrap()
    );
    assert!(!first.feedback.feedback_events.is_empty());
}

#[test]
fn test_unsorted_frames_rejected_before_scan() {
    let frames = vec![
        frame(9, 0, "VS Code", "Coding"),
        frame(8, 0, "VS Code", "Coding"),
    ];
    let store = CountingStore {
        reads: Cell::new(0),
    };

    let result = engine().build_timeline(date(), &frames, &store);
    assert!(matches!(
        result,
        Err(PipelineError::Frames(FrameError::Unsorted { .. }))
    ));
    assert_eq!(store.reads.get(), 0);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = Config::default();
    config.timeline.idle_similarity_threshold = 1.5;
    assert!(matches!(Engine::new(config), Err(PipelineError::Config(_))));

    let mut config = Config::default();
    config.timezone = "Mars/Olympus".to_string();
    assert!(matches!(Engine::new(config), Err(PipelineError::Config(_))));
}

#[test]
fn test_day_directory_end_to_end() {
    let dir = std::env::temp_dir().join(format!("focus-nudge-day-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    for name in ["08-00-00.png", "08-15-00.png", "09-10-00.png"] {
        std::fs::write(dir.join(name), png(64)).unwrap();
    }
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let frames_json = serde_json::json!({
        "frames": [
            { "timestamp": "2025-03-04T08:00:00", "evidence_id": "08-00-00.png",
              "dominant_surface": "YouTube", "activity": "Video", "confidence": 0.9 },
            { "timestamp": "2025-03-04T08:15:00", "evidence_id": "08-15-00.png",
              "dominant_surface": "YouTube", "activity": "Video", "confidence": 0.9 },
            { "timestamp": "2025-03-04T09:10:00", "evidence_id": "09-10-00.png",
              "dominant_surface": "YouTube", "activity": "Video", "confidence": 0.9 }
        ]
    });
    let frames_path = dir.join("frames.json");
    std::fs::write(&frames_path, frames_json.to_string()).unwrap();

    let store = frames::DirFrameStore::new(&dir);
    let listed = store.list_day_frames(date()).unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].0, at(8, 0));

    let frames = frames::load_frames(&frames_path, true).unwrap();
    let report = engine().run(date(), &frames, &store).unwrap();
    assert_eq!(report.timeline.idle_minutes(), 45);
    assert_eq!(report.timeline.file_name(), "timeline_2025-03-04.json");

    std::fs::remove_dir_all(&dir).ok();
}
