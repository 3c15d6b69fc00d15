//! Interactive swim-lane timeline bound to one render target.
//!
//! Zoom and edits go through a full layout pass. Pan only moves the
//! already-drawn layer via [`RenderTarget::set_pan_transform`].

use casetrail_core::time_model::parse_event_time;
use casetrail_core::{BackendError, EventTimeUpdate, TimelineBackend, TimelineDataset};
use casetrail_runtime_config::TimelineSettings;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clarification::{ClarificationDialog, ClarificationWorkflow, ClarifyError};
use crate::detail::EventDetail;
use crate::layout::{TimelineLayout, layout_timeline};
use crate::render::RenderTarget;
use crate::view_state::ViewState;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum EditError {
    #[error("no timeline is loaded")]
    NoDataset,
    #[error("timeline was not loaded from a session")]
    NoSession,
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("event {0} is not editable")]
    NotEditable(String),
    #[error("invalid event time: {0:?}")]
    InvalidTime(String),
    #[error("failed to update event time: {0}")]
    Backend(BackendError),
    #[error("event time saved but reload failed: {0}")]
    Reload(BackendError),
}

#[derive(Debug, Default)]
enum Content {
    #[default]
    Empty,
    Loaded {
        dataset: TimelineDataset,
        layout: TimelineLayout,
    },
    Failed(String),
}

pub struct TimelineView<T: RenderTarget> {
    target: T,
    settings: TimelineSettings,
    session_id: Option<String>,
    content: Content,
    state: ViewState,
    /// Pointer position minus pan offset at drag start.
    drag_anchor: Option<(f64, f64)>,
    clock: fn() -> DateTime<Utc>,
    clarification: ClarificationWorkflow,
}

impl<T: RenderTarget> TimelineView<T> {
    pub fn new(target: T, settings: TimelineSettings) -> Self {
        Self {
            target,
            settings,
            session_id: None,
            content: Content::Empty,
            state: ViewState::default(),
            drag_anchor: None,
            clock: Utc::now,
            clarification: ClarificationWorkflow::new(),
        }
    }

    /// Replace the wall clock used to pad missing time bounds.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn dataset(&self) -> Option<&TimelineDataset> {
        match &self.content {
            Content::Loaded { dataset, .. } => Some(dataset),
            _ => None,
        }
    }

    pub fn layout(&self) -> Option<&TimelineLayout> {
        match &self.content {
            Content::Loaded { layout, .. } => Some(layout),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.content {
            Content::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn clarification(&self) -> &ClarificationWorkflow {
        &self.clarification
    }

    /// Fetch the session's timeline and render it.
    ///
    /// On failure the content is replaced with an error panel; previously
    /// loaded data is not kept.
    pub async fn load<B: TimelineBackend>(
        &mut self,
        backend: &B,
        session_id: &str,
    ) -> Result<(), BackendError> {
        self.session_id = Some(session_id.to_string());
        self.reset_interaction();

        match backend.fetch_timeline(session_id).await {
            Ok(dataset) => {
                info!(
                    session_id,
                    witnesses = dataset.witnesses.len(),
                    events = dataset.events.len(),
                    "timeline loaded"
                );
                self.content = self.loaded(dataset);
                self.draw();
                Ok(())
            }
            Err(err) => {
                warn!(session_id, "failed to load timeline: {err}");
                self.content = Content::Failed(format!("Failed to load timeline: {err}"));
                self.draw();
                Err(err)
            }
        }
    }

    /// Render a dataset fetched elsewhere.
    pub fn set_data(&mut self, dataset: TimelineDataset) {
        self.reset_interaction();
        self.content = self.loaded(dataset);
        self.draw();
    }

    /// Full layout pass followed by a redraw.
    pub fn render(&mut self) {
        if let Content::Loaded { dataset, layout } = &mut self.content {
            *layout = layout_timeline(
                dataset,
                self.state.zoom,
                self.settings.lane_height,
                (self.clock)(),
            );
        }
        self.draw();
    }

    pub fn zoom_in(&mut self) {
        self.zoom_in_by(self.settings.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_out_by(self.settings.zoom_step);
    }

    pub fn zoom_in_by(&mut self, amount: f64) {
        self.apply_zoom(self.state.zoomed_in(amount));
    }

    pub fn zoom_out_by(&mut self, amount: f64) {
        self.apply_zoom(self.state.zoomed_out(amount));
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
    }

    /// Jump straight to a zoom factor (clamped).
    pub fn set_zoom(&mut self, zoom: f64) {
        self.apply_zoom(self.state.with_zoom(zoom));
    }

    /// Mouse wheel: scrolling up (negative delta) zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom_in_by(self.settings.wheel_step);
        } else if delta_y > 0.0 {
            self.zoom_out_by(self.settings.wheel_step);
        }
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.state = self.state.panned_by(dx, dy);
        self.target.set_pan_transform(self.state.pan);
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.drag_anchor = Some((x - self.state.pan.x, y - self.state.pan.y));
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some((ax, ay)) = self.drag_anchor else {
            return;
        };
        let pan = self.state.pan;
        self.pan_by(x - ax - pan.x, y - ay - pan.y);
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    /// Hit-test a screen point and open the event under it.
    pub fn click_at(&mut self, x: f64, y: f64) -> Option<EventDetail> {
        let canvas_x = x - self.state.pan.x;
        let canvas_y = y - self.state.pan.y;
        let event_id = self
            .layout()?
            .hit_test(canvas_x, canvas_y)
            .map(|m| m.event_id.clone());
        match event_id {
            Some(id) => self.inspect(&id),
            None => {
                self.clear_selection();
                None
            }
        }
    }

    pub fn inspect(&mut self, event_id: &str) -> Option<EventDetail> {
        let detail = EventDetail::from_dataset(self.dataset()?, event_id)?;
        self.state = self.state.with_selection(Some(event_id.to_string()));
        Some(detail)
    }

    pub fn clear_selection(&mut self) {
        self.state = self.state.with_selection(None);
    }

    /// Write a new absolute time for one event, then reload the whole
    /// dataset. The view is left untouched when the write fails.
    pub async fn submit_event_time<B: TimelineBackend>(
        &mut self,
        backend: &B,
        event_id: &str,
        new_time: &str,
    ) -> Result<(), EditError> {
        let dataset = self.dataset().ok_or(EditError::NoDataset)?;
        let session_id = self.session_id.clone().ok_or(EditError::NoSession)?;
        let event = dataset
            .event(event_id)
            .ok_or_else(|| EditError::UnknownEvent(event_id.to_string()))?;
        if !event.editable {
            return Err(EditError::NotEditable(event_id.to_string()));
        }
        let time = parse_event_time(new_time.trim())
            .ok_or_else(|| EditError::InvalidTime(new_time.to_string()))?;

        let update = EventTimeUpdate {
            event_time: time.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        if let Err(err) = backend.update_event_time(event_id, &update).await {
            warn!(event_id, "event time update failed: {err}");
            return Err(EditError::Backend(err));
        }
        info!(event_id, event_time = %update.event_time, "event time updated");

        self.load(backend, &session_id)
            .await
            .map_err(EditError::Reload)
    }

    pub async fn load_clarified<B: TimelineBackend>(
        &mut self,
        backend: &B,
        session_id: &str,
    ) -> Result<(), BackendError> {
        let result = self.clarification.load(backend, session_id).await;
        self.draw();
        result
    }

    pub fn open_clarification(
        &mut self,
        event_id: &str,
    ) -> Result<&mut ClarificationDialog, ClarifyError> {
        self.clarification.open_dialog(event_id)
    }

    pub fn clarification_dialog_mut(&mut self) -> Option<&mut ClarificationDialog> {
        self.clarification.dialog_mut()
    }

    pub async fn submit_clarification<B: TimelineBackend>(
        &mut self,
        backend: &B,
    ) -> Result<(), ClarifyError> {
        let result = self.clarification.submit(backend).await;
        if matches!(result, Ok(()) | Err(ClarifyError::Reload(_))) {
            self.draw();
        }
        result
    }

    fn loaded(&self, dataset: TimelineDataset) -> Content {
        let layout = layout_timeline(
            &dataset,
            self.state.zoom,
            self.settings.lane_height,
            (self.clock)(),
        );
        Content::Loaded { dataset, layout }
    }

    fn reset_interaction(&mut self) {
        self.state = ViewState::default();
        self.drag_anchor = None;
    }

    fn apply_zoom(&mut self, next: ViewState) {
        if next.zoom == self.state.zoom {
            return;
        }
        debug!(from = self.state.zoom, to = next.zoom, "zoom changed");
        self.state = next;
        self.render();
    }

    fn draw(&mut self) {
        self.target.clear();
        let layout = match &self.content {
            Content::Empty => None,
            Content::Failed(message) => {
                self.target.draw_error(message);
                None
            }
            Content::Loaded { layout, .. } => {
                self.target.draw_axis(&layout.ticks, layout.canvas_width);
                for lane in &layout.lanes {
                    self.target.draw_lane(lane);
                    for marker in &lane.markers {
                        self.target.draw_marker(marker);
                    }
                }
                Some(layout)
            }
        };
        self.clarification.render(&mut self.target, layout);
        self.target.set_pan_transform(self.state.pan);
    }
}
