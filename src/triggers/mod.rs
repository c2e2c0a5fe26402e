//! Behavioral nudge detection over a finished timeline.
//!
//! This module contains:
//! - The cooldown ledger shared by all detectors
//! - The four trigger detectors (first work, focus levels, return to work,
//!   anomalous switching)
//! - Event assembly into the final, time-ordered list

pub mod cooldown;
pub mod detectors;
pub mod event;
pub mod messages;

pub use cooldown::CooldownTracker;
pub use detectors::{
    detect_anomaly_switching, detect_first_work, detect_focus_levels, detect_return_to_work,
    WorkClassifier,
};
pub use event::{
    FeedbackDocument, FeedbackEvent, FeedbackUi, Intensity, Level, TriggerType, UiType,
};

use crate::config::TriggerConfig;
use crate::timeline::Segment;

/// One detector run over one day.
///
/// Owns a fresh [`CooldownTracker`]; consumed by [`TriggerPass::run`] so the
/// ledger can never leak into another day.
#[derive(Debug)]
pub struct TriggerPass<'a> {
    config: &'a TriggerConfig,
    cooldowns: CooldownTracker,
}

impl<'a> TriggerPass<'a> {
    pub fn new(config: &'a TriggerConfig) -> Self {
        Self {
            config,
            cooldowns: CooldownTracker::new(),
        }
    }

    /// Run every detector in order and assemble their output.
    pub fn run(mut self, segments: &[Segment]) -> Vec<FeedbackEvent> {
        let mut ordered = segments.to_vec();
        ordered.sort_by_key(Segment::start_minute);

        let work = WorkClassifier::new(&self.config.work_activity_set);
        let batches = vec![
            detect_first_work(&ordered, &work, &mut self.cooldowns, self.config),
            detect_focus_levels(&ordered, &work, &mut self.cooldowns, self.config),
            detect_return_to_work(&ordered, &work, &mut self.cooldowns, self.config),
            detect_anomaly_switching(&ordered, &work, &mut self.cooldowns, self.config),
        ];

        let events = assemble_events(batches);
        tracing::debug!(
            "Detected {} feedback events over {} segments",
            events.len(),
            ordered.len()
        );
        events
    }
}

/// Concatenate detector outputs and order them by minute of day.
///
/// The sort is stable: events at the same minute keep detector order
/// (first work, focus, return to work, anomaly) and, within a detector,
/// emission order.
pub fn assemble_events(batches: Vec<Vec<FeedbackEvent>>) -> Vec<FeedbackEvent> {
    let mut events: Vec<FeedbackEvent> = batches.into_iter().flatten().collect();
    events.sort_by_key(|e| e.time_minute_of_day);
    events
}

/// Detect all nudges for a day's segments with a fresh cooldown ledger.
pub fn generate_feedback_events(segments: &[Segment], config: &TriggerConfig) -> Vec<FeedbackEvent> {
    TriggerPass::new(config).run(segments)
}
