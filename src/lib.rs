//! Focus Nudge - daily activity timelines and behavioral nudges.
//!
//! This library turns a day of per-screenshot activity classifications into a
//! coherent timeline (with idle periods carved out) and scans that timeline for
//! moments worth a gentle nudge, under strict cooldown rules.
//!
//! # Guarantees
//!
//! - **Non-overlapping**: final segments are sorted and never overlap
//! - **Deterministic**: identical input yields identical output, message text included
//! - **Per-run state**: cooldowns live for one run only and are never persisted
//! - **Forgiving images**: unreadable screenshots never fail a run, they just never count as idle
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Focus Nudge                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌────────────┐     │
//! │  │ Interval │──▶│ Segment  │──▶│   Idle   │──▶│ Normalizer │     │
//! │  │ inference│   │ builder  │   │  carver  │   │  (S001..)  │     │
//! │  └──────────┘   └──────────┘   └──────────┘   └────────────┘     │
//! │                                     ▲               │            │
//! │                              ┌──────────┐           ▼            │
//! │                              │  Frame   │   ┌───────────────┐    │
//! │                              │  store   │   │   Detectors   │    │
//! │                              └──────────┘   │ + cooldowns   │    │
//! │                                             └───────────────┘    │
//! │                                                     │            │
//! │                                                     ▼            │
//! │                                             ┌───────────────┐    │
//! │                                             │ Feedback doc  │    │
//! │                                             └───────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use focus_nudge::{frames, Config, Engine};
//! use std::path::Path;
//!
//! let engine = Engine::new(Config::default()).expect("valid config");
//! let day = Path::new("screenshots/2025-03-04");
//! let frames = frames::load_frames(&day.join("frames.json"), false).expect("frames");
//! let store = frames::DirFrameStore::new(day);
//!
//! let date = frames[0].timestamp.date();
//! let report = engine.run(date, &frames, &store).expect("pipeline run");
//! println!("{} segments", report.timeline.segments.len());
//! ```

pub mod config;
pub mod frames;
pub mod pipeline;
pub mod timeline;
pub mod triggers;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, TimelineConfig, TriggerConfig};
pub use frames::{DirFrameStore, FrameError, FrameResult, FrameStore, MemoryFrameStore};
pub use pipeline::{DayReport, Engine, PipelineError};
pub use timeline::{segment_day, RiskFlag, Segment, Segmentation, Timeline};
pub use triggers::{
    generate_feedback_events, CooldownTracker, FeedbackDocument, FeedbackEvent, Level,
    TriggerPass, TriggerType,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
