//! Per-run engine tying segmentation and trigger detection together.

use crate::config::{Config, ConfigError};
use crate::frames::{validate_frames, FrameError, FrameResult, FrameStore};
use crate::timeline::{segment_day, Timeline};
use crate::triggers::{FeedbackDocument, TriggerPass};
use chrono::NaiveDate;
use chrono_tz::Tz;
use thiserror::Error;

/// Errors raised by the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frame input error: {0}")]
    Frames(#[from] FrameError),
}

/// Both artifacts produced for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub timeline: Timeline,
    pub feedback: FeedbackDocument,
}

/// A validated pipeline for one invocation.
///
/// Construction validates the whole configuration, so malformed settings are
/// reported before any frame is looked at. Nothing mutable outlives a call.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    tz: Tz,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self { config, tz })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Segment a day's frames into a timeline document.
    ///
    /// Zero frames is not an error: the timeline is simply empty.
    pub fn build_timeline(
        &self,
        date: NaiveDate,
        frames: &[FrameResult],
        store: &dyn FrameStore,
    ) -> Result<Timeline, PipelineError> {
        validate_frames(frames)?;

        let segmentation = segment_day(frames, store, &self.config.timeline);
        let timeline = Timeline::new(
            date,
            self.tz.name(),
            segmentation.inferred_interval_minutes,
            segmentation.segments,
        );

        tracing::info!(
            "Timeline {}: {} frames, {} segments, {} idle min",
            date,
            frames.len(),
            timeline.segments.len(),
            timeline.idle_minutes()
        );
        Ok(timeline)
    }

    /// Detect nudges over a timeline with a fresh cooldown ledger.
    pub fn feedback_for(&self, timeline: &Timeline) -> FeedbackDocument {
        let events = TriggerPass::new(&self.config.triggers).run(&timeline.segments);
        tracing::info!("Feedback {}: {} events", timeline.date_local, events.len());

        FeedbackDocument::new(
            timeline.date_local,
            timeline.timezone.clone(),
            timeline.inferred_interval_minutes,
            events,
        )
    }

    /// Full pipeline: frames to timeline to feedback events.
    pub fn run(
        &self,
        date: NaiveDate,
        frames: &[FrameResult],
        store: &dyn FrameStore,
    ) -> Result<DayReport, PipelineError> {
        let timeline = self.build_timeline(date, frames, store)?;
        let feedback = self.feedback_for(&timeline);
        Ok(DayReport { timeline, feedback })
    }
}
