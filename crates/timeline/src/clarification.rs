//! Clarity overlay and the dialog flow for events with ambiguous times.
//!
//! The clarified dataset is only ever replaced by a fresh fetch; a
//! submission never edits it locally.

use std::fmt;

use casetrail_core::time_model::MIN_CANVAS_WIDTH;
use casetrail_core::{
    BackendError, ClarificationRequest, ClarifiedEvent, ClarifiedTimeline, Clarity,
    DisambiguationPrompt, TimelineBackend,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::layout::{AXIS_HEIGHT, TimelineLayout};
use crate::render::RenderTarget;

/// Distance of the marker strip below the axis when no lanes are drawn.
const STRIP_OFFSET: f64 = 30.0;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ClarifyError {
    #[error("clarified timeline is not loaded")]
    NotLoaded,
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("event {0} does not need clarification")]
    NotPending(String),
    #[error("no clarification dialog is open")]
    NoDialog,
    #[error("offset description must not be empty")]
    EmptyOffset,
    #[error("clarification failed: {0}")]
    Backend(BackendError),
    #[error("clarification saved but reload failed: {0}")]
    Reload(BackendError),
}

/// Header numbers shown above the clarification markers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaritySummary {
    pub clarity_score: f64,
    pub overall_clarity: Clarity,
    pub needing_clarification: usize,
    pub total_events: usize,
}

impl ClaritySummary {
    pub fn from_timeline(timeline: &ClarifiedTimeline) -> Self {
        Self {
            clarity_score: timeline.clarity_score,
            overall_clarity: timeline.overall_clarity,
            needing_clarification: timeline.events_needing_clarification,
            total_events: timeline.total_events,
        }
    }
}

impl fmt::Display for ClaritySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}% ({}) · {} of {} events need clarification",
            self.clarity_score * 100.0,
            self.overall_clarity,
            self.needing_clarification,
            self.total_events
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationMarker {
    pub event_id: String,
    pub sequence: Option<i64>,
    pub clarity: Clarity,
    pub time_ref: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Operator input for one clarification, pre-filled from the event.
#[derive(Debug, Clone, PartialEq)]
pub struct ClarificationDialog {
    pub event_id: String,
    pub description: String,
    pub original_time_ref: Option<String>,
    pub suggested_question: Option<String>,
    pub offset_description: String,
    pub sequence: Option<i64>,
}

impl ClarificationDialog {
    fn for_event(event: &ClarifiedEvent) -> Self {
        Self {
            event_id: event.event.id.clone(),
            description: event.event.description.clone(),
            original_time_ref: event.original_time_ref.clone(),
            suggested_question: event.clarification_question.clone(),
            offset_description: String::new(),
            sequence: event.sequence,
        }
    }

    pub fn set_offset_description(&mut self, text: impl Into<String>) {
        self.offset_description = text.into();
    }

    pub fn override_sequence(&mut self, sequence: Option<i64>) {
        self.sequence = sequence;
    }

    pub fn request(&self) -> Result<ClarificationRequest, ClarifyError> {
        let offset = self.offset_description.trim();
        if offset.is_empty() {
            return Err(ClarifyError::EmptyOffset);
        }
        Ok(ClarificationRequest {
            event_id: self.event_id.clone(),
            offset_description: offset.to_string(),
            sequence: self.sequence,
        })
    }
}

#[derive(Debug, Clone, Default)]
enum ClarifiedState {
    #[default]
    NotLoaded,
    Loaded(ClarifiedTimeline),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct ClarificationWorkflow {
    session_id: Option<String>,
    state: ClarifiedState,
    dialog: Option<ClarificationDialog>,
}

impl ClarificationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the clarified dataset, replacing whatever was loaded before.
    pub async fn load<B: TimelineBackend>(
        &mut self,
        backend: &B,
        session_id: &str,
    ) -> Result<(), BackendError> {
        self.dialog = None;
        self.session_id = Some(session_id.to_string());
        match backend.fetch_clarified(session_id).await {
            Ok(timeline) => {
                info!(
                    session_id,
                    pending = timeline.events_needing_clarification,
                    "clarified timeline loaded"
                );
                self.state = ClarifiedState::Loaded(timeline);
                Ok(())
            }
            Err(err) => {
                warn!(session_id, "failed to load clarified timeline: {err}");
                self.state = ClarifiedState::Failed(format!("Failed to load clarified timeline: {err}"));
                Err(err)
            }
        }
    }

    pub fn timeline(&self) -> Option<&ClarifiedTimeline> {
        match &self.state {
            ClarifiedState::Loaded(timeline) => Some(timeline),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ClarifiedState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ClarifiedState::NotLoaded)
    }

    pub fn summary(&self) -> Option<ClaritySummary> {
        self.timeline().map(ClaritySummary::from_timeline)
    }

    /// One marker per event needing clarification, in sequence order.
    ///
    /// Markers sit in a strip under the lanes. An event whose time parses and
    /// falls inside the current layout is placed at that time; the rest are
    /// spread over evenly spaced slots.
    pub fn markers(&self, layout: Option<&TimelineLayout>) -> Vec<ClarificationMarker> {
        let Some(timeline) = self.timeline() else {
            return Vec::new();
        };
        let pending = timeline.pending();
        let (width, y) = match layout {
            Some(l) => (l.canvas_width, l.canvas_height() + l.lane_height / 2.0),
            None => (MIN_CANVAS_WIDTH, AXIS_HEIGHT + STRIP_OFFSET),
        };
        let slots = pending.len().max(1) as f64;

        pending
            .iter()
            .enumerate()
            .map(|(slot, event)| {
                let timed_x = layout.and_then(|l| {
                    let t = event.event.timestamp()?;
                    l.range.contains(t).then(|| l.to_pixel(t))
                });
                ClarificationMarker {
                    event_id: event.event.id.clone(),
                    sequence: event.sequence,
                    clarity: event.clarity,
                    time_ref: event.original_time_ref.clone(),
                    x: timed_x.unwrap_or((slot as f64 + 0.5) / slots * width),
                    y,
                }
            })
            .collect()
    }

    /// Draw the banner and markers, or the load error.
    pub fn render<T: RenderTarget>(&self, target: &mut T, layout: Option<&TimelineLayout>) {
        match &self.state {
            ClarifiedState::NotLoaded => {}
            ClarifiedState::Failed(message) => target.draw_error(message),
            ClarifiedState::Loaded(timeline) => {
                target.draw_clarity_banner(&ClaritySummary::from_timeline(timeline));
                for marker in self.markers(layout) {
                    target.draw_clarification_marker(&marker);
                }
            }
        }
    }

    pub fn open_dialog(&mut self, event_id: &str) -> Result<&mut ClarificationDialog, ClarifyError> {
        let timeline = self.timeline().ok_or(ClarifyError::NotLoaded)?;
        let event = timeline
            .event(event_id)
            .ok_or_else(|| ClarifyError::UnknownEvent(event_id.to_string()))?;
        if !event.needs_clarification {
            return Err(ClarifyError::NotPending(event_id.to_string()));
        }
        let dialog = ClarificationDialog::for_event(event);
        Ok(self.dialog.insert(dialog))
    }

    pub fn dialog(&self) -> Option<&ClarificationDialog> {
        self.dialog.as_ref()
    }

    pub fn dialog_mut(&mut self) -> Option<&mut ClarificationDialog> {
        self.dialog.as_mut()
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Post the open dialog. On success the dialog closes and the clarified
    /// dataset is fetched again; on failure the dialog stays open.
    pub async fn submit<B: TimelineBackend>(&mut self, backend: &B) -> Result<(), ClarifyError> {
        let session_id = self.session_id.clone().ok_or(ClarifyError::NotLoaded)?;
        let dialog = self.dialog.as_ref().ok_or(ClarifyError::NoDialog)?;
        let request = dialog.request()?;

        if let Err(err) = backend.submit_clarification(&request).await {
            warn!(event_id = %request.event_id, "clarification rejected: {err}");
            return Err(ClarifyError::Backend(err));
        }
        info!(event_id = %request.event_id, "clarification submitted");

        self.dialog = None;
        self.load(backend, &session_id)
            .await
            .map_err(ClarifyError::Reload)
    }

    /// Pending disambiguation question, if the backend has one.
    pub async fn pending_disambiguation<B: TimelineBackend>(
        backend: &B,
        session_id: &str,
    ) -> Result<Option<DisambiguationPrompt>, BackendError> {
        backend.fetch_disambiguation(session_id).await
    }
}
