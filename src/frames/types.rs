//! Per-screenshot classification records.
//!
//! A `FrameResult` is produced once per screenshot by the external classifier
//! and never mutated afterwards. Raw classifier output is loosely typed, so it
//! passes through [`normalize_classification`] at the boundary, which reports
//! every field it had to default instead of silently merging it into a real value.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Maximum number of secondary surfaces kept per frame or segment.
pub const MAX_SUPPORTING_SURFACES: usize = 3;

/// Surface used when the classifier gave none.
pub const UNKNOWN_SURFACE: &str = "Unknown";

/// Activity used when the classifier gave none.
pub const OTHER_ACTIVITY: &str = "Other";

/// One classified screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Local wall-clock capture time
    pub timestamp: NaiveDateTime,
    /// Identifier of the screenshot in the frame store (its file name)
    pub evidence_id: String,
    pub dominant_surface: String,
    pub activity: String,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub supporting_surfaces: Vec<String>,
    #[serde(default)]
    pub context_detail: String,
    #[serde(default)]
    pub notes: String,
}

impl FrameResult {
    /// Build a frame from an already normalized classification.
    pub fn from_classification(
        timestamp: NaiveDateTime,
        evidence_id: impl Into<String>,
        classification: Classification,
    ) -> Self {
        Self {
            timestamp,
            evidence_id: evidence_id.into(),
            dominant_surface: classification.dominant_surface,
            activity: classification.activity,
            confidence: classification.confidence,
            supporting_surfaces: classification.supporting_surfaces,
            context_detail: classification.context_detail,
            notes: classification.notes,
        }
    }

    /// The `(dominant_surface, activity)` key frames are grouped by.
    pub fn bucket(&self) -> (&str, &str) {
        (&self.dominant_surface, &self.activity)
    }

    /// Check the strict schema: labels present, confidence in range,
    /// at most three supporting surfaces.
    pub fn check(&self) -> Result<(), String> {
        if self.evidence_id.trim().is_empty() {
            return Err("evidence_id is empty".to_string());
        }
        if self.dominant_surface.trim().is_empty() {
            return Err("dominant_surface is empty".to_string());
        }
        if self.activity.trim().is_empty() {
            return Err("activity is empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} is outside [0, 1]", self.confidence));
        }
        if self.supporting_surfaces.len() > MAX_SUPPORTING_SURFACES {
            return Err(format!(
                "{} supporting surfaces (max {MAX_SUPPORTING_SURFACES})",
                self.supporting_surfaces.len()
            ));
        }
        Ok(())
    }
}

/// Classifier fields of a frame after boundary normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub dominant_surface: String,
    pub activity: String,
    pub context_detail: String,
    pub confidence: f64,
    pub supporting_surfaces: Vec<String>,
    pub notes: String,
}

/// What was wrong with a classifier field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Field absent or null
    Missing,
    /// Field present but blank
    Empty,
    /// Field present with the wrong JSON type
    InvalidType,
    /// Numeric field outside its allowed range (clamped)
    OutOfRange,
    /// List longer than allowed, or holding non-string entries (trimmed)
    Truncated,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IssueKind::Missing => "is missing",
            IssueKind::Empty => "is empty",
            IssueKind::InvalidType => "has an invalid type",
            IssueKind::OutOfRange => "is out of range",
            IssueKind::Truncated => "was truncated",
        };
        f.write_str(text)
    }
}

/// A field that had to be defaulted or repaired during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub kind: IssueKind,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.kind)
    }
}

/// Normalize raw classifier JSON into a [`Classification`].
///
/// Blank or absent `dominant_surface`/`activity` become `"Unknown"`/`"Other"`,
/// confidence is clamped to [0, 1] and supporting surfaces are trimmed to three
/// non-empty strings. Every repair is reported as a [`FieldIssue`].
pub fn normalize_classification(raw: &Value) -> (Classification, Vec<FieldIssue>) {
    let mut issues = Vec::new();

    let dominant_surface = label_field(raw, "dominant_surface", &mut issues)
        .unwrap_or_else(|| UNKNOWN_SURFACE.to_string());
    let activity =
        label_field(raw, "activity", &mut issues).unwrap_or_else(|| OTHER_ACTIVITY.to_string());

    let classification = Classification {
        dominant_surface,
        activity,
        context_detail: text_field(raw, "context_detail", &mut issues),
        confidence: confidence_field(raw, &mut issues),
        supporting_surfaces: surfaces_field(raw, &mut issues),
        notes: text_field(raw, "notes", &mut issues),
    };

    (classification, issues)
}

/// Required label: missing, blank and mistyped values are all issues.
fn label_field(raw: &Value, field: &'static str, issues: &mut Vec<FieldIssue>) -> Option<String> {
    match raw.get(field) {
        None | Some(Value::Null) => {
            issues.push(FieldIssue {
                field,
                kind: IssueKind::Missing,
            });
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            issues.push(FieldIssue {
                field,
                kind: IssueKind::Empty,
            });
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            issues.push(FieldIssue {
                field,
                kind: IssueKind::InvalidType,
            });
            None
        }
    }
}

/// Optional free text: only a wrong type is reported.
fn text_field(raw: &Value, field: &'static str, issues: &mut Vec<FieldIssue>) -> String {
    match raw.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            issues.push(FieldIssue {
                field,
                kind: IssueKind::InvalidType,
            });
            String::new()
        }
    }
}

fn confidence_field(raw: &Value, issues: &mut Vec<FieldIssue>) -> f64 {
    const FIELD: &str = "confidence";

    let value = match raw.get(FIELD) {
        None | Some(Value::Null) => {
            issues.push(FieldIssue {
                field: FIELD,
                kind: IssueKind::Missing,
            });
            return 0.0;
        }
        Some(Value::Number(n)) => n.as_f64(),
        // Some classifiers quote numbers
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() => {
            if !(0.0..=1.0).contains(&v) {
                issues.push(FieldIssue {
                    field: FIELD,
                    kind: IssueKind::OutOfRange,
                });
            }
            v.clamp(0.0, 1.0)
        }
        _ => {
            issues.push(FieldIssue {
                field: FIELD,
                kind: IssueKind::InvalidType,
            });
            0.0
        }
    }
}

fn surfaces_field(raw: &Value, issues: &mut Vec<FieldIssue>) -> Vec<String> {
    const FIELD: &str = "supporting_surfaces";

    let items = match raw.get(FIELD) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            issues.push(FieldIssue {
                field: FIELD,
                kind: IssueKind::InvalidType,
            });
            return Vec::new();
        }
    };

    let surfaces: Vec<String> = items
        .iter()
        .filter_map(|item| item.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    let dropped_entries = surfaces.len() != items.len();
    if dropped_entries || surfaces.len() > MAX_SUPPORTING_SURFACES {
        issues.push(FieldIssue {
            field: FIELD,
            kind: IssueKind::Truncated,
        });
    }

    surfaces.into_iter().take(MAX_SUPPORTING_SURFACES).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_classification_has_no_issues() {
        let raw = json!({
            "dominant_surface": " GitHub ",
            "activity": "Coding",
            "context_detail": "reviewing a pull request",
            "confidence": 0.91,
            "supporting_surfaces": ["Terminal", "Slack"],
            "notes": ""
        });

        let (c, issues) = normalize_classification(&raw);
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(c.dominant_surface, "GitHub");
        assert_eq!(c.activity, "Coding");
        assert_eq!(c.supporting_surfaces, vec!["Terminal", "Slack"]);
        assert!((c.confidence - 0.91).abs() < 1e-9);
    }

    #[test]
    fn test_missing_and_mistyped_surface_are_distinguished() {
        let (c, issues) = normalize_classification(&json!({ "activity": "Video", "confidence": 0.5 }));
        assert_eq!(c.dominant_surface, UNKNOWN_SURFACE);
        assert_eq!(
            issues,
            vec![FieldIssue {
                field: "dominant_surface",
                kind: IssueKind::Missing
            }]
        );

        let (c, issues) =
            normalize_classification(&json!({ "dominant_surface": 42, "activity": "Video", "confidence": 0.5 }));
        assert_eq!(c.dominant_surface, UNKNOWN_SURFACE);
        assert_eq!(issues[0].kind, IssueKind::InvalidType);
    }

    #[test]
    fn test_blank_activity_becomes_other() {
        let (c, issues) = normalize_classification(
            &json!({ "dominant_surface": "Slack", "activity": "   ", "confidence": 0.7 }),
        );
        assert_eq!(c.activity, OTHER_ACTIVITY);
        assert_eq!(issues[0].kind, IssueKind::Empty);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let (c, issues) = normalize_classification(
            &json!({ "dominant_surface": "Slack", "activity": "Messaging", "confidence": 1.7 }),
        );
        assert_eq!(c.confidence, 1.0);
        assert_eq!(issues[0].kind, IssueKind::OutOfRange);

        let (c, _) = normalize_classification(
            &json!({ "dominant_surface": "Slack", "activity": "Messaging", "confidence": "0.4" }),
        );
        assert!((c.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_supporting_surfaces_capped_at_three() {
        let (c, issues) = normalize_classification(&json!({
            "dominant_surface": "Notion",
            "activity": "Writing/Reading",
            "confidence": 0.8,
            "supporting_surfaces": ["A", "", "B", 7, "C", "D"]
        }));
        assert_eq!(c.supporting_surfaces, vec!["A", "B", "C"]);
        assert_eq!(issues[0].kind, IssueKind::Truncated);
    }

    #[test]
    fn test_frame_check() {
        let (c, _) = normalize_classification(
            &json!({ "dominant_surface": "Slack", "activity": "Messaging", "confidence": 0.7 }),
        );
        let ts = chrono::NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut frame = FrameResult::from_classification(ts, "09-00-00.png", c);
        assert!(frame.check().is_ok());
        assert_eq!(frame.bucket(), ("Slack", "Messaging"));

        frame.confidence = 1.5;
        assert!(frame.check().is_err());
    }
}
