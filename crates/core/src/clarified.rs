use serde::{Deserialize, Serialize};

use crate::timeline::Event;

/// Secondary timeline with per-event clarity grading, fetched on demand and
/// always replaced as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarifiedTimeline {
    #[serde(default)]
    pub overall_clarity: Clarity,
    #[serde(default)]
    pub clarity_score: f64,
    #[serde(default)]
    pub events_needing_clarification: usize,
    #[serde(default)]
    pub total_events: usize,
    #[serde(default)]
    pub events: Vec<ClarifiedEvent>,
}

impl ClarifiedTimeline {
    pub fn event(&self, id: &str) -> Option<&ClarifiedEvent> {
        self.events.iter().find(|e| e.event.id == id)
    }

    /// Events awaiting an operator clarification, ordered by `sequence`
    /// (unsequenced events last, dataset order preserved among equals).
    pub fn pending(&self) -> Vec<&ClarifiedEvent> {
        let mut pending: Vec<&ClarifiedEvent> = self
            .events
            .iter()
            .filter(|e| e.needs_clarification)
            .collect();
        pending.sort_by_key(|e| (e.sequence.is_none(), e.sequence));
        pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarifiedEvent {
    #[serde(flatten)]
    pub event: Event,
    #[serde(default)]
    pub needs_clarification: bool,
    #[serde(default)]
    pub clarity: Clarity,
    #[serde(default)]
    pub clarification_question: Option<String>,
    #[serde(default)]
    pub original_time_ref: Option<String>,
    #[serde(default)]
    pub sequence: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clarity {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Clarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Clarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /timeline/clarify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    pub event_id: String,
    pub offset_description: String,
    pub sequence: Option<i64>,
}

/// A pending disambiguation question, if the backend has one queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationPrompt {
    pub event_id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}
