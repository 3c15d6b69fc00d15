//! Contract between the view components and whatever serves their data.
//!
//! `casetrail-api-client` implements these over HTTP; tests use in-memory fakes.
//! Every call is a single request: no retry, no backoff.

use thiserror::Error;

use crate::animation::AnimationDataset;
use crate::clarified::{ClarificationRequest, ClarifiedTimeline, DisambiguationPrompt};
use crate::timeline::{EventTimeUpdate, TimelineDataset, WriteAck};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    #[error("{status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("rejected by server: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Turn a write acknowledgement with `success: false` into an error.
    pub fn check_ack(ack: WriteAck) -> Result<WriteAck, BackendError> {
        if ack.success {
            Ok(ack)
        } else {
            Err(BackendError::Rejected(
                ack.message.unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait TimelineBackend {
    async fn fetch_timeline(&self, session_id: &str) -> Result<TimelineDataset, BackendError>;

    async fn fetch_clarified(&self, session_id: &str) -> Result<ClarifiedTimeline, BackendError>;

    async fn fetch_disambiguation(
        &self,
        session_id: &str,
    ) -> Result<Option<DisambiguationPrompt>, BackendError>;

    async fn update_event_time(
        &self,
        event_id: &str,
        update: &EventTimeUpdate,
    ) -> Result<WriteAck, BackendError>;

    async fn submit_clarification(
        &self,
        request: &ClarificationRequest,
    ) -> Result<WriteAck, BackendError>;
}

#[allow(async_fn_in_trait)]
pub trait AnimationBackend {
    async fn fetch_animation(&self, version: &str) -> Result<AnimationDataset, BackendError>;

    async fn generate_animation(&self, version: &str) -> Result<AnimationDataset, BackendError>;
}
