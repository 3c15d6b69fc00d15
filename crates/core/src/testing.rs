use std::sync::{Mutex, MutexGuard};

use crate::animation::{AnimationDataset, Keyframe, KeyframeAction, KeyframeProperties};
use crate::backend::{AnimationBackend, BackendError, TimelineBackend};
use crate::clarified::{
    ClarificationRequest, ClarifiedEvent, ClarifiedTimeline, Clarity, DisambiguationPrompt,
};
use crate::timeline::{
    Contradiction, Event, EventKind, EventTimeUpdate, Severity, TimeBounds, TimelineDataset,
    Witness, WriteAck,
};

/// Witness with `source_type = "statement"`.
pub fn witness(id: &str, name: &str) -> Witness {
    Witness {
        id: id.to_string(),
        name: name.to_string(),
        source_type: "statement".to_string(),
    }
}

/// Statement event; `time` is stored verbatim so callers can pass malformed values.
pub fn event(id: &str, witness_id: &str, time: Option<&str>, confidence: f64) -> Event {
    Event {
        id: id.to_string(),
        kind: EventKind::Statement,
        event_time: time.map(str::to_string),
        witness_id: witness_id.to_string(),
        description: format!("description of {id}"),
        confidence,
        needs_review: false,
        editable: true,
        image_url: None,
    }
}

pub fn contradiction(event_ids: &[&str], severity: Severity) -> Contradiction {
    Contradiction {
        event_ids: event_ids.iter().map(|id| id.to_string()).collect(),
        severity,
        description: format!("conflict between {}", event_ids.join(", ")),
    }
}

/// Two witnesses, four events between 10:00 and 11:00 UTC on 2026-03-01,
/// one untimed event and one contradiction (`e1` vs `e3`).
pub fn dataset() -> TimelineDataset {
    TimelineDataset {
        witnesses: vec![witness("w1", "Ada"), witness("w2", "Grace")],
        events: vec![
            event("e1", "w1", Some("2026-03-01T10:00:00Z"), 0.9),
            event("e2", "w1", Some("2026-03-01T10:30:00Z"), 0.5),
            event("e3", "w2", Some("2026-03-01T10:05:00Z"), 0.2),
            event("e4", "w2", Some("2026-03-01T11:00:00Z"), 0.75),
            event("e5", "w2", None, 0.9),
        ],
        contradictions: vec![contradiction(&["e1", "e3"], Severity::High)],
        time_bounds: TimeBounds {
            earliest: Some("2026-03-01T10:00:00Z".to_string()),
            latest: Some("2026-03-01T11:00:00Z".to_string()),
        },
    }
}

pub fn clarified_event(id: &str, needs_clarification: bool, sequence: Option<i64>) -> ClarifiedEvent {
    ClarifiedEvent {
        event: event(id, "w1", None, 0.5),
        needs_clarification,
        clarity: if needs_clarification {
            Clarity::Low
        } else {
            Clarity::High
        },
        clarification_question: needs_clarification.then(|| format!("When exactly did {id} happen?")),
        original_time_ref: Some("shortly after".to_string()),
        sequence,
    }
}

pub fn clarified(events: Vec<ClarifiedEvent>) -> ClarifiedTimeline {
    let pending = events.iter().filter(|e| e.needs_clarification).count();
    let total = events.len();
    ClarifiedTimeline {
        overall_clarity: if pending == 0 {
            Clarity::High
        } else {
            Clarity::Medium
        },
        clarity_score: if total == 0 {
            1.0
        } else {
            1.0 - pending as f64 / total as f64
        },
        events_needing_clarification: pending,
        total_events: total,
        events,
    }
}

pub fn keyframe(element_id: &str, time_offset: f64, duration: f64, action: KeyframeAction) -> Keyframe {
    Keyframe {
        element_id: element_id.to_string(),
        time_offset,
        duration,
        action,
        properties: KeyframeProperties::default(),
    }
}

pub fn animation(total_duration: f64, keyframes: Vec<Keyframe>) -> AnimationDataset {
    AnimationDataset {
        total_duration,
        keyframes,
    }
}

/// In-memory backend that records every call.
///
/// Writes are applied to the stored datasets so a reload observes them, the
/// way the real server recomputes derived fields.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[derive(Default)]
pub struct FakeState {
    pub timeline: Option<TimelineDataset>,
    pub clarified: Option<ClarifiedTimeline>,
    pub disambiguation: Option<DisambiguationPrompt>,
    pub animation: Option<AnimationDataset>,
    pub read_error: Option<BackendError>,
    pub write_error: Option<BackendError>,
    pub calls: Vec<String>,
    pub clarifications: Vec<ClarificationRequest>,
}

impl FakeBackend {
    pub fn with_timeline(timeline: TimelineDataset) -> Self {
        let backend = Self::default();
        backend.state().timeline = Some(timeline);
        backend
    }

    pub fn with_animation(animation: AnimationDataset) -> Self {
        let backend = Self::default();
        backend.state().animation = Some(animation);
        backend
    }

    /// Direct access to the fake's state for arranging and asserting.
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn read<T: Clone>(
        &self,
        call: String,
        pick: impl FnOnce(&FakeState) -> Option<T>,
    ) -> Result<T, BackendError> {
        let mut state = self.state();
        state.calls.push(call);
        if let Some(err) = state.read_error.clone() {
            return Err(err);
        }
        pick(&state).ok_or_else(|| BackendError::Status {
            status: 404,
            body: "not found".to_string(),
        })
    }
}

impl TimelineBackend for FakeBackend {
    async fn fetch_timeline(&self, session_id: &str) -> Result<TimelineDataset, BackendError> {
        self.read(format!("GET timeline {session_id}"), |s| s.timeline.clone())
    }

    async fn fetch_clarified(&self, session_id: &str) -> Result<ClarifiedTimeline, BackendError> {
        self.read(format!("GET clarified {session_id}"), |s| s.clarified.clone())
    }

    async fn fetch_disambiguation(
        &self,
        session_id: &str,
    ) -> Result<Option<DisambiguationPrompt>, BackendError> {
        self.read(format!("GET disambiguation {session_id}"), |s| {
            Some(s.disambiguation.clone())
        })
    }

    async fn update_event_time(
        &self,
        event_id: &str,
        update: &EventTimeUpdate,
    ) -> Result<WriteAck, BackendError> {
        let mut state = self.state();
        state.calls.push(format!("PUT event {event_id} {}", update.event_time));
        if let Some(err) = state.write_error.clone() {
            return Err(err);
        }
        if let Some(event) = state
            .timeline
            .as_mut()
            .and_then(|t| t.events.iter_mut().find(|e| e.id == event_id))
        {
            event.event_time = Some(update.event_time.clone());
        }
        Ok(WriteAck {
            success: true,
            message: None,
        })
    }

    async fn submit_clarification(
        &self,
        request: &ClarificationRequest,
    ) -> Result<WriteAck, BackendError> {
        let mut state = self.state();
        state.calls.push(format!("POST clarify {}", request.event_id));
        if let Some(err) = state.write_error.clone() {
            return Err(err);
        }
        state.clarifications.push(request.clone());
        if let Some(event) = state
            .clarified
            .as_mut()
            .and_then(|c| c.events.iter_mut().find(|e| e.event.id == request.event_id))
        {
            event.needs_clarification = false;
            event.clarity = Clarity::High;
            if request.sequence.is_some() {
                event.sequence = request.sequence;
            }
        }
        if let Some(clarified) = state.clarified.as_mut() {
            *clarified = self::clarified(std::mem::take(&mut clarified.events));
        }
        Ok(WriteAck {
            success: true,
            message: None,
        })
    }
}

impl AnimationBackend for FakeBackend {
    async fn fetch_animation(&self, version: &str) -> Result<AnimationDataset, BackendError> {
        self.read(format!("GET animation {version}"), |s| s.animation.clone())
    }

    async fn generate_animation(&self, version: &str) -> Result<AnimationDataset, BackendError> {
        self.read(format!("POST generate {version}"), |s| s.animation.clone())
    }
}
