//! Drawing surface abstraction.
//!
//! The view computes geometry and hands it to a [`RenderTarget`]; a concrete
//! surface (canvas, terminal, test recorder) decides how to draw it.

use std::fmt::Write as _;

use casetrail_core::time_model::Tick;

use crate::clarification::{ClarificationMarker, ClaritySummary};
use crate::layout::{LaneLayout, MarkerLayout};
use crate::view_state::PanOffset;

pub trait RenderTarget {
    /// Discard everything drawn so far. Called once at the start of each
    /// full layout pass.
    fn clear(&mut self);

    fn draw_axis(&mut self, ticks: &[Tick], canvas_width: f64);

    fn draw_lane(&mut self, lane: &LaneLayout);

    fn draw_marker(&mut self, marker: &MarkerLayout);

    fn draw_error(&mut self, message: &str);

    /// Move the already-drawn layer. Must not trigger any re-layout.
    fn set_pan_transform(&mut self, offset: PanOffset);

    fn draw_clarity_banner(&mut self, summary: &ClaritySummary);

    fn draw_clarification_marker(&mut self, marker: &ClarificationMarker);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Axis { ticks: usize, canvas_width: f64 },
    Lane { witness_id: String, y: f64, width: f64 },
    Marker { event_id: String, x: f64, y: f64, classes: Vec<&'static str> },
    Error(String),
    Pan(PanOffset),
    ClarityBanner(String),
    ClarificationMarker { event_id: String, x: f64 },
}

/// In-memory target that keeps a log of draw calls.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub calls: Vec<DrawCall>,
    pub layout_passes: usize,
    pub pan: PanOffset,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers drawn since the last clear, by event id.
    pub fn marker_ids(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Marker { event_id, .. } => Some(event_id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn marker_x(&self, event_id: &str) -> Option<f64> {
        self.calls.iter().find_map(|call| match call {
            DrawCall::Marker { event_id: id, x, .. } if id == event_id => Some(*x),
            _ => None,
        })
    }

    pub fn error(&self) -> Option<&str> {
        self.calls.iter().find_map(|call| match call {
            DrawCall::Error(message) => Some(message.as_str()),
            _ => None,
        })
    }
}

impl RenderTarget for RecordingTarget {
    fn clear(&mut self) {
        self.calls.clear();
        self.layout_passes += 1;
        self.calls.push(DrawCall::Clear);
    }

    fn draw_axis(&mut self, ticks: &[Tick], canvas_width: f64) {
        self.calls.push(DrawCall::Axis {
            ticks: ticks.len(),
            canvas_width,
        });
    }

    fn draw_lane(&mut self, lane: &LaneLayout) {
        self.calls.push(DrawCall::Lane {
            witness_id: lane.witness_id.clone(),
            y: lane.y,
            width: lane.width,
        });
    }

    fn draw_marker(&mut self, marker: &MarkerLayout) {
        self.calls.push(DrawCall::Marker {
            event_id: marker.event_id.clone(),
            x: marker.x,
            y: marker.y,
            classes: marker.style.classes(),
        });
    }

    fn draw_error(&mut self, message: &str) {
        self.calls.push(DrawCall::Error(message.to_string()));
    }

    fn set_pan_transform(&mut self, offset: PanOffset) {
        self.pan = offset;
        self.calls.push(DrawCall::Pan(offset));
    }

    fn draw_clarity_banner(&mut self, summary: &ClaritySummary) {
        self.calls.push(DrawCall::ClarityBanner(summary.to_string()));
    }

    fn draw_clarification_marker(&mut self, marker: &ClarificationMarker) {
        self.calls.push(DrawCall::ClarificationMarker {
            event_id: marker.event_id.clone(),
            x: marker.x,
        });
    }
}

/// Plain-text surface for terminals and logs.
#[derive(Debug, Default)]
pub struct TextTarget {
    lines: Vec<String>,
    pan: PanOffset,
}

impl TextTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.pan != PanOffset::ZERO {
            let _ = write!(out, "\n(panned {:+.0}px, {:+.0}px)", self.pan.x, self.pan.y);
        }
        out
    }
}

impl RenderTarget for TextTarget {
    fn clear(&mut self) {
        self.lines.clear();
    }

    fn draw_axis(&mut self, ticks: &[Tick], canvas_width: f64) {
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        self.lines
            .push(format!("axis [{canvas_width:.0}px]: {}", labels.join(" | ")));
    }

    fn draw_lane(&mut self, lane: &LaneLayout) {
        let source = if lane.source_type.is_empty() {
            String::new()
        } else {
            format!(" ({})", lane.source_type)
        };
        self.lines.push(format!("── {}{source} ──", lane.label));
    }

    fn draw_marker(&mut self, marker: &MarkerLayout) {
        self.lines.push(format!(
            "  {:>7.1}px  {}  {}  {}  [{}]",
            marker.x,
            marker.time.format("%H:%M:%S"),
            marker.style.icon(),
            marker.event_id,
            marker.style.classes()[1..].join(" "),
        ));
    }

    fn draw_error(&mut self, message: &str) {
        self.lines.push(format!("error: {message}"));
    }

    fn set_pan_transform(&mut self, offset: PanOffset) {
        self.pan = offset;
    }

    fn draw_clarity_banner(&mut self, summary: &ClaritySummary) {
        self.lines.push(format!("clarity: {summary}"));
    }

    fn draw_clarification_marker(&mut self, marker: &ClarificationMarker) {
        let sequence = marker
            .sequence
            .map(|s| format!("#{s}"))
            .unwrap_or_else(|| "#-".to_string());
        self.lines.push(format!(
            "  ? {:>7.1}px  {sequence}  {}  {}",
            marker.x,
            marker.event_id,
            marker.time_ref.as_deref().unwrap_or("")
        ));
    }
}
