use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_model::parse_event_time;

/// Timeline payload for one case/session: witnesses, their events and the
/// contradictions the backend derived between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineDataset {
    #[serde(default)]
    pub witnesses: Vec<Witness>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub contradictions: Vec<Contradiction>,
    #[serde(default)]
    pub time_bounds: TimeBounds,
}

impl TimelineDataset {
    pub fn witness(&self, id: &str) -> Option<&Witness> {
        self.witnesses.iter().find(|w| w.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events belonging to one swim lane, in dataset order.
    pub fn events_for_witness<'a>(&'a self, witness_id: &'a str) -> impl Iterator<Item = &'a Event> {
        self.events.iter().filter(move |e| e.witness_id == witness_id)
    }

    /// True when `event_id` appears in any contradiction.
    pub fn is_conflicted(&self, event_id: &str) -> bool {
        self.contradictions.iter().any(|c| c.involves(event_id))
    }

    /// Contradictions that reference `event_id`, in dataset order.
    pub fn contradictions_for(&self, event_id: &str) -> Vec<&Contradiction> {
        self.contradictions
            .iter()
            .filter(|c| c.involves(event_id))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    #[serde(default)]
    pub earliest: Option<String>,
    #[serde(default)]
    pub latest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub source_type: String,
}

/// A single witness event placed on a swim lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    /// Absolute time as sent by the backend; events without a parseable time
    /// are not drawn.
    #[serde(default)]
    pub event_time: Option<String>,
    pub witness_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Event {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.event_time.as_deref().and_then(parse_event_time)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Statement,
    Correction,
    TimelineEvent,
    SceneGeneration,
    /// Styling falls back to a neutral marker for kinds this build does not know.
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statement => "statement",
            Self::Correction => "correction",
            Self::TimelineEvent => "timeline_event",
            Self::SceneGeneration => "scene_generation",
            Self::Other => "other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Statement => "💬",
            Self::Correction => "✏️",
            Self::TimelineEvent => "📍",
            Self::SceneGeneration => "🎬",
            Self::Other => "•",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    #[serde(default)]
    pub event_ids: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

impl Contradiction {
    pub fn involves(&self, event_id: &str) -> bool {
        self.event_ids.iter().any(|id| id == event_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `PUT /timeline/events/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimeUpdate {
    pub event_time: String,
}

/// Generic acknowledgement returned by write endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TimelineDataset {
        serde_json::from_str(
            r#"{
                "witnesses": [{"id": "w1", "name": "Ada", "source_type": "statement"}],
                "events": [
                    {"id": "e1", "type": "statement", "event_time": "2026-03-01T10:00:00Z",
                     "witness_id": "w1", "description": "heard a bang", "confidence": 0.9,
                     "needs_review": false, "editable": true},
                    {"id": "e2", "type": "hologram", "witness_id": "w1", "description": "?"}
                ],
                "contradictions": [{"event_ids": ["e1", "e9"], "severity": "high", "description": "clash"}],
                "time_bounds": {"earliest": "2026-03-01T09:00:00Z", "latest": null}
            }"#,
        )
        .expect("parse dataset")
    }

    #[test]
    fn unknown_event_type_falls_back_to_other() {
        let data = sample();
        assert_eq!(data.events[1].kind, EventKind::Other);
        assert_eq!(data.events[1].timestamp(), None);
    }

    #[test]
    fn conflict_is_id_membership() {
        let data = sample();
        assert!(data.is_conflicted("e1"));
        assert!(!data.is_conflicted("e2"));
        assert_eq!(data.contradictions_for("e1")[0].severity, Severity::High);
    }

    #[test]
    fn write_ack_defaults_to_success() {
        let ack: WriteAck = serde_json::from_str("{}").expect("parse ack");
        assert!(ack.success);
        assert!(ack.message.is_none());
    }
}
