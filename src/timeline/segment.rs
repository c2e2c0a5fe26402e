//! Timeline segment types.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in one day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Annotation on a segment signalling reduced trust or synthetic origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    None,
    LowConfidence,
    IdleDetected,
}

/// A provisional segment with exact boundaries, used while building and carving.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub dominant_surface: String,
    pub activity: String,
    pub context_detail: String,
    pub confidence: f64,
    pub supporting_surfaces: Vec<String>,
    pub evidence_frame_ids: Vec<String>,
    pub notes: String,
    pub risk_flags: Vec<RiskFlag>,
}

impl TimedSegment {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Duration rounded to whole minutes.
    pub fn rounded_minutes(&self) -> i64 {
        (self.duration().num_seconds() as f64 / 60.0).round() as i64
    }

    /// Whether `[start, end)` intersects `[other_start, other_end)`.
    pub fn overlaps(&self, other_start: NaiveDateTime, other_end: NaiveDateTime) -> bool {
        other_start < self.end && other_end > self.start
    }
}

/// A finalized timeline segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Sequential id in time order (`S001`, `S002`, ...)
    pub id: String,
    /// Local start time (`HH:MM`)
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Local end time (`HH:MM`)
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub duration_minutes: i64,
    pub dominant_surface: String,
    pub activity: String,
    #[serde(default)]
    pub context_detail: String,
    pub confidence: f64,
    #[serde(default)]
    pub supporting_surfaces: Vec<String>,
    #[serde(default)]
    pub evidence_frame_ids: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub risk_flags: Vec<RiskFlag>,
    /// Explicit work flag; overrides the activity-based classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_work: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Segment {
    /// Start as minutes since local midnight.
    pub fn start_minute(&self) -> i64 {
        minute_of_day(self.start)
    }

    /// End as minutes since local midnight.
    ///
    /// A segment extrapolated past midnight ends "earlier" than it starts on
    /// the clock; its end is then reported on the following day (`+ 1440`).
    pub fn end_minute(&self) -> i64 {
        let end = minute_of_day(self.end);
        if end < self.start_minute() {
            end + MINUTES_PER_DAY
        } else {
            end
        }
    }

    pub fn start_local(&self) -> String {
        self.start.format(hhmm::FORMAT).to_string()
    }

    pub fn end_local(&self) -> String {
        self.end.format(hhmm::FORMAT).to_string()
    }
}

/// Minutes since midnight for a wall-clock time, ignoring seconds.
pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Serde support for `HH:MM` times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
