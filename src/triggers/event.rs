//! Nudge events and the feedback artifact that carries them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The current feedback document format version.
pub const FEEDBACK_SCHEMA_VERSION: &str = "1.0";

/// Artifact type tag of the feedback document.
pub const FEEDBACK_ARTIFACT_TYPE: &str = "feedback_events";

/// Which detector produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    FirstWork,
    Focus,
    ReturnToWork,
    Anomaly,
}

impl TriggerType {
    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::FirstWork => "first_work",
            TriggerType::Focus => "focus",
            TriggerType::ReturnToWork => "return_to_work",
            TriggerType::Anomaly => "anomaly",
        }
    }
}

/// Nudge escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    L1,
    L2,
    L3,
}

impl Level {
    /// Level for a zero-based focus threshold index.
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Level::L1),
            1 => Some(Level::L2),
            2 => Some(Level::L3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::L1 => "L1",
            Level::L2 => "L2",
            Level::L3 => "L3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiType {
    CornerBubble,
    Toast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Light,
    Medium,
}

/// How the notification layer should present an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackUi {
    #[serde(rename = "type")]
    pub ui_type: UiType,
    pub ttl_sec: u32,
    pub can_close: bool,
    pub intensity: Intensity,
}

/// Seconds a nudge stays on screen.
pub const DEFAULT_TTL_SEC: u32 = 6;

impl FeedbackUi {
    pub fn corner_bubble(intensity: Intensity) -> Self {
        Self {
            ui_type: UiType::CornerBubble,
            ttl_sec: DEFAULT_TTL_SEC,
            can_close: true,
            intensity,
        }
    }

    pub fn toast(intensity: Intensity) -> Self {
        Self {
            ui_type: UiType::Toast,
            ttl_sec: DEFAULT_TTL_SEC,
            can_close: true,
            intensity,
        }
    }
}

/// A behavioral nudge emitted by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub event_id: String,
    /// Local `HH:MM` the event refers to
    pub time_local: String,
    pub time_minute_of_day: i64,
    pub trigger_type: TriggerType,
    pub level: Level,
    pub ui: FeedbackUi,
    pub message: String,
    pub evidence_segment_ids: Vec<String>,
    pub project_id: Option<String>,
    pub confidence: f64,
    pub cooldown_minutes: i64,
}

/// One day's feedback events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDocument {
    pub schema_version: String,
    pub artifact_type: String,
    pub date_local: NaiveDate,
    pub timezone: String,
    pub capture_interval_minutes: i64,
    pub feedback_events: Vec<FeedbackEvent>,
}

impl FeedbackDocument {
    pub fn new(
        date_local: NaiveDate,
        timezone: impl Into<String>,
        capture_interval_minutes: i64,
        feedback_events: Vec<FeedbackEvent>,
    ) -> Self {
        Self {
            schema_version: FEEDBACK_SCHEMA_VERSION.to_string(),
            artifact_type: FEEDBACK_ARTIFACT_TYPE.to_string(),
            date_local,
            timezone: timezone.into(),
            capture_interval_minutes,
            feedback_events,
        }
    }

    /// Artifact file name for this day.
    pub fn file_name(&self) -> String {
        format!("feedback_events_{}.json", self.date_local.format("%Y-%m-%d"))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
