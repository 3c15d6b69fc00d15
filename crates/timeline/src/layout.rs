use casetrail_core::time_model::{self, Tick, TimeRange};
use casetrail_core::{Event, EventKind, TimelineDataset};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Height of the tick axis above the first lane.
pub const AXIS_HEIGHT: f64 = 30.0;
/// Half-size of a marker's clickable square.
pub const MARKER_RADIUS: f64 = 8.0;
/// Confidence below this marks an event for review.
pub const REVIEW_CONFIDENCE: f64 = 0.7;
const MEDIUM_CONFIDENCE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= REVIEW_CONFIDENCE {
            Self::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "med",
            Self::Low => "low",
        }
    }
}

/// Visual state of one marker; a pure function of the event and the
/// dataset's contradictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub kind: EventKind,
    pub conflicted: bool,
    pub needs_review: bool,
    pub confidence: ConfidenceBucket,
}

impl MarkerStyle {
    pub fn for_event(event: &Event, dataset: &TimelineDataset) -> Self {
        Self {
            kind: event.kind,
            conflicted: dataset.is_conflicted(&event.id),
            needs_review: event.needs_review || event.confidence < REVIEW_CONFIDENCE,
            confidence: ConfidenceBucket::from_confidence(event.confidence),
        }
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["event-marker", self.kind.as_str()];
        if self.conflicted {
            classes.push("has-conflict");
        }
        if self.needs_review {
            classes.push("needs-review");
        }
        classes.push(self.confidence.class());
        classes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayout {
    pub event_id: String,
    pub witness_id: String,
    pub time: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
    pub style: MarkerStyle,
}

impl MarkerLayout {
    fn distance_sq(&self, x: f64, y: f64) -> Option<f64> {
        let dx = (self.x - x).abs();
        let dy = (self.y - y).abs();
        (dx <= MARKER_RADIUS && dy <= MARKER_RADIUS).then_some(dx * dx + dy * dy)
    }
}

/// One witness swim lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLayout {
    pub index: usize,
    pub witness_id: String,
    pub label: String,
    pub source_type: String,
    pub y: f64,
    pub height: f64,
    /// Length of the horizontal guide line.
    pub width: f64,
    pub markers: Vec<MarkerLayout>,
}

impl LaneLayout {
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Complete geometry for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
    pub range: TimeRange,
    pub canvas_width: f64,
    pub zoom: f64,
    pub lane_height: f64,
    pub ticks: Vec<Tick>,
    pub lanes: Vec<LaneLayout>,
    /// Events dropped because their time is missing or unparseable.
    pub untimed: usize,
    /// Events dropped because they fall outside the padded range.
    pub clipped: usize,
}

impl TimelineLayout {
    pub fn canvas_height(&self) -> f64 {
        AXIS_HEIGHT + self.lanes.len() as f64 * self.lane_height
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerLayout> {
        self.lanes.iter().flat_map(|lane| lane.markers.iter())
    }

    pub fn marker(&self, event_id: &str) -> Option<&MarkerLayout> {
        self.markers().find(|m| m.event_id == event_id)
    }

    /// Nearest marker whose clickable square contains the canvas point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&MarkerLayout> {
        self.markers()
            .filter_map(|m| m.distance_sq(x, y).map(|d| (m, d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| m)
    }

    pub fn to_pixel(&self, t: DateTime<Utc>) -> f64 {
        time_model::to_pixel(t, &self.range, self.canvas_width)
    }
}

/// Lay out every witness lane and its markers.
///
/// Lanes follow dataset witness order. An event is placed on the lane whose
/// witness id it carries; events without a parseable time or outside the
/// padded range are left out.
pub fn layout_timeline(
    dataset: &TimelineDataset,
    zoom: f64,
    lane_height: f64,
    now: DateTime<Utc>,
) -> TimelineLayout {
    let range = time_model::time_range(&dataset.time_bounds, now);
    let canvas_width = time_model::canvas_width(&range, zoom);
    let ticks = time_model::ticks(&range, canvas_width);

    let mut untimed = 0usize;
    let mut clipped = 0usize;
    let mut lanes = Vec::with_capacity(dataset.witnesses.len());

    for (index, witness) in dataset.witnesses.iter().enumerate() {
        let y = AXIS_HEIGHT + index as f64 * lane_height;
        let center_y = y + lane_height / 2.0;
        let mut markers = Vec::new();

        for event in dataset.events_for_witness(&witness.id) {
            let Some(time) = event.timestamp() else {
                debug!(event_id = %event.id, "skipping event without a usable time");
                untimed += 1;
                continue;
            };
            let x = time_model::to_pixel(time, &range, canvas_width);
            if !time_model::is_on_canvas(x, canvas_width) {
                clipped += 1;
                continue;
            }
            markers.push(MarkerLayout {
                event_id: event.id.clone(),
                witness_id: witness.id.clone(),
                time,
                x,
                y: center_y,
                style: MarkerStyle::for_event(event, dataset),
            });
        }

        lanes.push(LaneLayout {
            index,
            witness_id: witness.id.clone(),
            label: witness.name.clone(),
            source_type: witness.source_type.clone(),
            y,
            height: lane_height,
            width: canvas_width,
            markers,
        });
    }

    TimelineLayout {
        range,
        canvas_width,
        zoom,
        lane_height,
        ticks,
        lanes,
        untimed,
        clipped,
    }
}
