use std::fmt;

use casetrail_core::{Contradiction, Event, TimelineDataset};
use chrono::{DateTime, Utc};

use crate::layout::{ConfidenceBucket, MarkerStyle};

/// Everything the inspect panel shows for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetail {
    pub event: Event,
    /// Falls back to the raw witness id when the witness is not in the dataset.
    pub witness_name: String,
    pub time: Option<DateTime<Utc>>,
    pub confidence: ConfidenceBucket,
    pub contradictions: Vec<Contradiction>,
    pub style: MarkerStyle,
}

impl EventDetail {
    pub fn from_dataset(dataset: &TimelineDataset, event_id: &str) -> Option<Self> {
        let event = dataset.event(event_id)?;
        let witness_name = dataset
            .witness(&event.witness_id)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| event.witness_id.clone());

        Some(Self {
            witness_name,
            time: event.timestamp(),
            confidence: ConfidenceBucket::from_confidence(event.confidence),
            contradictions: dataset
                .contradictions_for(event_id)
                .into_iter()
                .cloned()
                .collect(),
            style: MarkerStyle::for_event(event, dataset),
            event: event.clone(),
        })
    }

    pub fn editable(&self) -> bool {
        self.event.editable
    }

    /// Confidence as a whole percentage, e.g. `"75%"`.
    pub fn confidence_badge(&self) -> String {
        format!("{:.0}%", self.event.confidence * 100.0)
    }
}

impl fmt::Display for EventDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} [{}]",
            self.style.icon(),
            self.event.id,
            self.event.kind
        )?;
        writeln!(f, "witness:    {}", self.witness_name)?;
        match self.time {
            Some(time) => writeln!(f, "time:       {}", time.to_rfc3339())?,
            None => writeln!(
                f,
                "time:       {} (not placed)",
                self.event.event_time.as_deref().unwrap_or("unknown")
            )?,
        }
        writeln!(
            f,
            "confidence: {} ({})",
            self.confidence_badge(),
            self.confidence.class()
        )?;
        if self.style.needs_review {
            writeln!(f, "review:     needed")?;
        }
        writeln!(f, "editable:   {}", if self.editable() { "yes" } else { "no" })?;
        writeln!(f)?;
        writeln!(f, "{}", self.event.description)?;
        if let Some(url) = &self.event.image_url {
            writeln!(f, "image: {url}")?;
        }
        for contradiction in &self.contradictions {
            writeln!(
                f,
                "conflict ({}): {} [{}]",
                contradiction.severity,
                contradiction.description,
                contradiction.event_ids.join(", ")
            )?;
        }
        Ok(())
    }
}
