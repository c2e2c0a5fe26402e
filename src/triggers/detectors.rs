//! Trigger detectors.
//!
//! Each detector is a single forward pass over the time-ordered segments of a
//! day. They share one [`CooldownTracker`] so a key that fired in one pass is
//! visible to later ones.

use crate::config::TriggerConfig;
use crate::timeline::Segment;
use crate::triggers::cooldown::CooldownTracker;
use crate::triggers::event::{FeedbackEvent, FeedbackUi, Intensity, Level, TriggerType};
use crate::triggers::messages;
use std::collections::{BTreeSet, HashSet};

pub const FIRST_WORK_KEY: &str = "first_work";
pub const RETURN_TO_WORK_KEY: &str = "return_to_work";
pub const ANOMALY_KEY: &str = "anomaly_switching";

/// Segment ids cited by a focus event (most recent of the chain).
const FOCUS_EVIDENCE: usize = 6;
/// Off-work segment ids cited by a return-to-work event.
const RETURN_EVIDENCE: usize = 6;
/// Window segment ids cited by an anomaly event.
const ANOMALY_EVIDENCE: usize = 12;

const FIRST_WORK_CONFIDENCE: f64 = 0.75;
const FOCUS_CONFIDENCE: f64 = 0.85;
const RETURN_CONFIDENCE: f64 = 0.8;
const ANOMALY_CONFIDENCE: f64 = 0.7;

/// Cooldown key of a focus level.
pub fn focus_key(level: Level) -> String {
    format!("focus_{}", level.as_str())
}

/// Decides whether a segment counts as work.
#[derive(Debug, Clone, Copy)]
pub struct WorkClassifier<'a> {
    work_activities: &'a BTreeSet<String>,
}

impl<'a> WorkClassifier<'a> {
    pub fn new(work_activities: &'a BTreeSet<String>) -> Self {
        Self { work_activities }
    }

    /// An explicit `is_work` flag wins; otherwise the activity label must be
    /// in the work set (exact match).
    pub fn is_work(&self, segment: &Segment) -> bool {
        segment
            .is_work
            .unwrap_or_else(|| self.work_activities.contains(&segment.activity))
    }
}

fn tail(ids: &[String], n: usize) -> Vec<String> {
    ids[ids.len().saturating_sub(n)..].to_vec()
}

/// Nudge once at the start of the first work segment of the day.
///
/// Only the first work segment is ever considered, whether or not it fires.
pub fn detect_first_work(
    segments: &[Segment],
    work: &WorkClassifier<'_>,
    cooldowns: &mut CooldownTracker,
    config: &TriggerConfig,
) -> Vec<FeedbackEvent> {
    let Some(segment) = segments.iter().find(|s| work.is_work(s)) else {
        return Vec::new();
    };

    let start = segment.start_minute();
    if !cooldowns.can_send(FIRST_WORK_KEY, start, config.first_work_cooldown_minutes) {
        return Vec::new();
    }
    cooldowns.mark_sent(FIRST_WORK_KEY, start);
    tracing::debug!("first_work fired at {}", segment.start_local());

    vec![FeedbackEvent {
        event_id: format!("firstwork_{}", segment.id),
        time_local: segment.start_local(),
        time_minute_of_day: start,
        trigger_type: TriggerType::FirstWork,
        level: Level::L1,
        ui: FeedbackUi::corner_bubble(Intensity::Light),
        message: messages::first_work_message(),
        evidence_segment_ids: vec![segment.id.clone()],
        project_id: segment.project_id.clone(),
        confidence: FIRST_WORK_CONFIDENCE,
        cooldown_minutes: config.first_work_cooldown_minutes,
    }]
}

/// Encourage sustained focus as a work chain crosses each threshold.
///
/// Every level fires at most once per chain; any non-work segment breaks the
/// chain and re-arms all levels.
pub fn detect_focus_levels(
    segments: &[Segment],
    work: &WorkClassifier<'_>,
    cooldowns: &mut CooldownTracker,
    config: &TriggerConfig,
) -> Vec<FeedbackEvent> {
    let mut events = Vec::new();
    let mut consecutive_work_minutes = 0;
    let mut emitted: HashSet<Level> = HashSet::new();
    let mut chain_ids: Vec<String> = Vec::new();
    let mut chain_project: Option<String> = None;

    for segment in segments {
        if !work.is_work(segment) {
            consecutive_work_minutes = 0;
            emitted.clear();
            chain_ids.clear();
            chain_project = None;
            continue;
        }

        consecutive_work_minutes += segment.duration_minutes;
        chain_ids.push(segment.id.clone());
        if segment.project_id.is_some() {
            chain_project = segment.project_id.clone();
        }
        let end = segment.end_minute();

        for (idx, &threshold) in config.focus_thresholds.iter().enumerate() {
            let Some(level) = Level::from_index(idx) else {
                break;
            };
            let key = focus_key(level);
            if consecutive_work_minutes < threshold
                || emitted.contains(&level)
                || !cooldowns.can_send(&key, end, config.focus_cooldown_minutes)
            {
                continue;
            }

            let variants = messages::focus_variants(level, threshold);
            let salt = messages::focus_salt(&segment.id, level, end);
            let message = messages::choose(&variants, &salt)
                .unwrap_or_default()
                .to_string();
            let intensity = if level == Level::L1 {
                Intensity::Light
            } else {
                Intensity::Medium
            };

            events.push(FeedbackEvent {
                event_id: format!("focus_{}_{}", segment.id, level.as_str()),
                time_local: segment.end_local(),
                time_minute_of_day: end,
                trigger_type: TriggerType::Focus,
                level,
                ui: FeedbackUi::corner_bubble(intensity),
                message,
                evidence_segment_ids: tail(&chain_ids, FOCUS_EVIDENCE),
                project_id: chain_project.clone(),
                confidence: FOCUS_CONFIDENCE,
                cooldown_minutes: config.focus_cooldown_minutes,
            });
            cooldowns.mark_sent(&key, end);
            emitted.insert(level);
            tracing::debug!(
                "focus {} fired at {} after {} min",
                level.as_str(),
                segment.end_local(),
                consecutive_work_minutes
            );
        }
    }

    events
}

/// Welcome the user back after a long enough off-work stretch.
///
/// Off-work tracking resets on every transition back into work, fired or not.
pub fn detect_return_to_work(
    segments: &[Segment],
    work: &WorkClassifier<'_>,
    cooldowns: &mut CooldownTracker,
    config: &TriggerConfig,
) -> Vec<FeedbackEvent> {
    let mut events = Vec::new();
    let mut offwork_minutes = 0;
    let mut offwork_ids: Vec<String> = Vec::new();
    let mut was_off = false;

    for segment in segments {
        if !work.is_work(segment) {
            was_off = true;
            offwork_minutes += segment.duration_minutes;
            offwork_ids.push(segment.id.clone());
            continue;
        }

        let start = segment.start_minute();
        if was_off
            && offwork_minutes >= config.min_offwork_minutes
            && cooldowns.can_send(
                RETURN_TO_WORK_KEY,
                start,
                config.return_to_work_cooldown_minutes,
            )
        {
            let mut evidence = tail(&offwork_ids, RETURN_EVIDENCE);
            evidence.push(segment.id.clone());

            events.push(FeedbackEvent {
                event_id: format!("return_{}", segment.id),
                time_local: segment.start_local(),
                time_minute_of_day: start,
                trigger_type: TriggerType::ReturnToWork,
                level: Level::L2,
                ui: FeedbackUi::toast(Intensity::Medium),
                message: messages::return_to_work_message(offwork_minutes),
                evidence_segment_ids: evidence,
                project_id: segment.project_id.clone(),
                confidence: RETURN_CONFIDENCE,
                cooldown_minutes: config.return_to_work_cooldown_minutes,
            });
            cooldowns.mark_sent(RETURN_TO_WORK_KEY, start);
            tracing::debug!(
                "return_to_work fired at {} after {} min away",
                segment.start_local(),
                offwork_minutes
            );
        }

        was_off = false;
        offwork_minutes = 0;
        offwork_ids.clear();
    }

    events
}

/// Flag windows with frequent work/non-work switching.
///
/// Windows are sequential and non-overlapping: once a window spans the
/// configured length it is evaluated and then reset unconditionally.
pub fn detect_anomaly_switching(
    segments: &[Segment],
    work: &WorkClassifier<'_>,
    cooldowns: &mut CooldownTracker,
    config: &TriggerConfig,
) -> Vec<FeedbackEvent> {
    let mut events = Vec::new();
    let mut switches: u32 = 0;
    let mut prev: Option<bool> = None;
    let mut window_start: Option<i64> = None;
    let mut window_ids: Vec<String> = Vec::new();

    for segment in segments {
        let end = segment.end_minute();
        let current = work.is_work(segment);
        let start = *window_start.get_or_insert(segment.start_minute());

        window_ids.push(segment.id.clone());
        if prev.is_some_and(|p| p != current) {
            switches += 1;
        }
        prev = Some(current);

        if end - start < config.anomaly_window_minutes {
            continue;
        }

        if switches >= config.anomaly_switch_threshold
            && cooldowns.can_send(ANOMALY_KEY, end, config.anomaly_cooldown_minutes)
        {
            events.push(FeedbackEvent {
                event_id: format!("anomaly_{}", segment.id),
                time_local: segment.end_local(),
                time_minute_of_day: end,
                trigger_type: TriggerType::Anomaly,
                level: Level::L2,
                ui: FeedbackUi::toast(Intensity::Medium),
                message: messages::anomaly_message(end - start, switches),
                evidence_segment_ids: tail(&window_ids, ANOMALY_EVIDENCE),
                project_id: None,
                confidence: ANOMALY_CONFIDENCE,
                cooldown_minutes: config.anomaly_cooldown_minutes,
            });
            cooldowns.mark_sent(ANOMALY_KEY, end);
            tracing::debug!(
                "anomaly fired at {} with {} switches",
                segment.end_local(),
                switches
            );
        }

        switches = 0;
        prev = None;
        window_start = None;
        window_ids.clear();
    }

    events
}
