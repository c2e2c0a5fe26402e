//! Serializable timeline artifact consumed by reporting and the UI.

use crate::timeline::segment::Segment;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The current timeline document format version.
pub const TIMELINE_SCHEMA_VERSION: &str = "2.0";

/// One day's activity timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub schema_version: String,
    pub date_local: NaiveDate,
    pub timezone: String,
    pub inferred_interval_minutes: i64,
    #[serde(default)]
    pub timeline_human_readable: Vec<String>,
    pub segments: Vec<Segment>,
}

impl Timeline {
    pub fn new(
        date_local: NaiveDate,
        timezone: impl Into<String>,
        inferred_interval_minutes: i64,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            schema_version: TIMELINE_SCHEMA_VERSION.to_string(),
            date_local,
            timezone: timezone.into(),
            inferred_interval_minutes,
            timeline_human_readable: segments.iter().map(human_line).collect(),
            segments,
        }
    }

    /// Load a timeline artifact from disk.
    pub fn load(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Artifact file name for this day.
    pub fn file_name(&self) -> String {
        format!("timeline_{}.json", self.date_local.format("%Y-%m-%d"))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Total minutes spent in Idle segments.
    pub fn idle_minutes(&self) -> i64 {
        self.segments
            .iter()
            .filter(|s| s.activity == crate::timeline::idle::IDLE_LABEL)
            .map(|s| s.duration_minutes)
            .sum()
    }
}

/// `08:00-08:22  VS Code  | Coding (confidence: 0.90)`
pub fn human_line(segment: &Segment) -> String {
    format!(
        "{}-{}  {}  | {} (confidence: {:.2})",
        segment.start_local(),
        segment.end_local(),
        segment.dominant_surface,
        segment.activity,
        segment.confidence
    )
}
