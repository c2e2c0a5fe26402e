//! Frame input for the focus-nudge pipeline.
//!
//! This module contains:
//! - The `FrameResult` schema and classifier output normalization
//! - The `FrameStore` collaborator that serves screenshot bytes
//! - Loading a day's frames from a JSON file

pub mod store;
pub mod types;

pub use store::{parse_capture_name, DirFrameStore, FrameStore, MemoryFrameStore};
pub use types::{
    normalize_classification, Classification, FieldIssue, FrameResult, IssueKind,
    MAX_SUPPORTING_SURFACES,
};

use chrono::NaiveDateTime;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading frame input.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame #{index}: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("frame {evidence_id}: classifier field {issue}")]
    Schema {
        evidence_id: String,
        issue: FieldIssue,
    },

    #[error("frame {evidence_id} at {timestamp} is earlier than the frame before it")]
    Unsorted {
        evidence_id: String,
        timestamp: NaiveDateTime,
    },
}

/// Read a day's frames from a JSON file.
///
/// The file holds either an array of frames or an object with a `frames`
/// array. Each entry needs a `timestamp` (local `YYYY-MM-DDTHH:MM:SS`) and an
/// `evidence_id`; the remaining classifier fields are normalized. With
/// `strict` set, any normalization issue is an error instead of a warning.
pub fn load_frames(path: &Path, strict: bool) -> Result<Vec<FrameResult>, FrameError> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    parse_frames(&value, strict)
}

/// Parse frames from an already decoded JSON document.
pub fn parse_frames(value: &Value, strict: bool) -> Result<Vec<FrameResult>, FrameError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("frames") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(FrameError::Malformed {
                    index: 0,
                    reason: "expected an array of frames or a `frames` array".to_string(),
                })
            }
        },
        _ => {
            return Err(FrameError::Malformed {
                index: 0,
                reason: "expected an array of frames or a `frames` array".to_string(),
            })
        }
    };

    let mut frames = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let timestamp = entry
            .get("timestamp")
            .and_then(Value::as_str)
            .ok_or_else(|| FrameError::Malformed {
                index,
                reason: "missing `timestamp`".to_string(),
            })?
            .parse::<NaiveDateTime>()
            .map_err(|e| FrameError::Malformed {
                index,
                reason: format!("invalid `timestamp`: {e}"),
            })?;

        let evidence_id = entry
            .get("evidence_id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| FrameError::Malformed {
                index,
                reason: "missing `evidence_id`".to_string(),
            })?;

        let (classification, issues) = normalize_classification(entry);
        if let Some(issue) = issues.first() {
            if strict {
                return Err(FrameError::Schema {
                    evidence_id: evidence_id.to_string(),
                    issue: issue.clone(),
                });
            }
            for issue in &issues {
                tracing::warn!("Frame {}: classifier field {}", evidence_id, issue);
            }
        }

        frames.push(FrameResult::from_classification(
            timestamp,
            evidence_id,
            classification,
        ));
    }

    ensure_sorted(&frames)?;
    Ok(frames)
}

/// Check frames handed to the pipeline directly: each must satisfy the strict
/// schema, and the sequence must be in capture order.
pub fn validate_frames(frames: &[FrameResult]) -> Result<(), FrameError> {
    for (index, frame) in frames.iter().enumerate() {
        frame
            .check()
            .map_err(|reason| FrameError::Malformed { index, reason })?;
    }
    ensure_sorted(frames)
}

/// Frames must arrive in ascending capture order.
pub fn ensure_sorted(frames: &[FrameResult]) -> Result<(), FrameError> {
    match frames
        .windows(2)
        .find(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        Some(pair) => Err(FrameError::Unsorted {
            evidence_id: pair[1].evidence_id.clone(),
            timestamp: pair[1].timestamp,
        }),
        None => Ok(()),
    }
}
