//! Nudge message text.
//!
//! Variant selection is a pure function of a salt string: the salt is hashed
//! with SHA-256 and the first four digest bytes pick the index. No RNG is
//! involved, so the same timeline always yields the same messages.

use crate::triggers::event::Level;
use sha2::{Digest, Sha256};

/// Pick one option deterministically from `salt`.
pub fn choose<'a>(options: &'a [String], salt: &str) -> Option<&'a str> {
    if options.is_empty() {
        return None;
    }
    let digest = Sha256::digest(salt.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let idx = prefix as usize % options.len();
    Some(options[idx].as_str())
}

/// Salt for a focus message.
pub fn focus_salt(segment_id: &str, level: Level, end_minute: i64) -> String {
    format!("{}_{}_{}", segment_id, level.as_str(), end_minute)
}

/// Message variants for a focus level reached at `threshold` minutes.
pub fn focus_variants(level: Level, threshold: i64) -> Vec<String> {
    match level {
        Level::L1 => vec![
            format!("{threshold} minutes of steady focus. Good time for a sip of water."),
            format!("{threshold} focused minutes done. A quick stretch will feel good."),
            format!("You've been focused for {threshold} minutes. Nice rhythm, keep it up."),
        ],
        Level::L2 => vec![
            format!("{threshold} minutes in. Consider a short break before the next push."),
            format!("{threshold} minutes of deep work. Rest your eyes for a moment."),
            format!("Focused for {threshold} minutes now. You've earned a small reward."),
        ],
        Level::L3 => vec![
            format!("{threshold} minutes of focus. Solid progress today."),
            format!("{threshold} minutes straight. Get up and loosen your shoulders."),
            format!("You reached {threshold} focused minutes. Great work, remember to hydrate."),
        ],
    }
}

pub fn first_work_message() -> String {
    "Work session started. Let's move the important things forward a little today.".to_string()
}

pub fn return_to_work_message(offwork_minutes: i64) -> String {
    format!(
        "Welcome back. You were away from work for {offwork_minutes} minutes; \
         wrapping up this stretch now would be great."
    )
}

pub fn anomaly_message(window_minutes: i64, switches: u32) -> String {
    format!(
        "{switches} switches between work and other things in the last {window_minutes} minutes. \
         Pick one small task and stay on it for 10 minutes."
    )
}
