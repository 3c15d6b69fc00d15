use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use casetrail_core::backend::{AnimationBackend, BackendError, TimelineBackend};
use casetrail_core::{
    AnimationDataset, ClarificationRequest, ClarifiedTimeline, DisambiguationPrompt,
    EventTimeUpdate, TimelineDataset, WriteAck,
};

/// Typed HTTP client for the case-management timeline API.
///
/// One request per call, surfaced immediately on failure. The optional
/// bearer token is attached to every request.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    pub fn set_auth(&mut self, token: String) {
        if token.trim().is_empty() {
            self.auth_token = None;
        } else {
            self.auth_token = Some(token);
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn session_url(&self, path: &str, session_id: &str) -> String {
        format!(
            "{}?session_id={}",
            self.url(path),
            urlencoding::encode(session_id)
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, BackendError> {
        debug!("GET {url}");
        let resp = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(transport)?;
        parse_response(resp).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        body: Option<&B>,
    ) -> Result<T, BackendError> {
        let req = match body {
            Some(body) => req.json(body),
            None => req,
        };
        let resp = self.authorize(req).send().await.map_err(transport)?;
        parse_response(resp).await
    }

    // ── Timeline ──────────────────────────────────────────────────────────

    pub async fn timeline(&self, session_id: &str) -> Result<TimelineDataset, BackendError> {
        self.get(self.session_url("/timeline/visualization", session_id))
            .await
    }

    pub async fn clarified_timeline(
        &self,
        session_id: &str,
    ) -> Result<ClarifiedTimeline, BackendError> {
        self.get(self.session_url("/timeline/clarified", session_id))
            .await
    }

    pub async fn disambiguation(
        &self,
        session_id: &str,
    ) -> Result<Option<DisambiguationPrompt>, BackendError> {
        self.get(self.session_url("/timeline/disambiguation", session_id))
            .await
    }

    pub async fn put_event_time(
        &self,
        event_id: &str,
        update: &EventTimeUpdate,
    ) -> Result<WriteAck, BackendError> {
        let url = self.url(&format!(
            "/timeline/events/{}",
            urlencoding::encode(event_id)
        ));
        debug!("PUT {url}");
        let ack = self.send_json(self.client.put(&url), Some(update)).await?;
        BackendError::check_ack(ack)
    }

    pub async fn post_clarification(
        &self,
        request: &ClarificationRequest,
    ) -> Result<WriteAck, BackendError> {
        let url = self.url("/timeline/clarify");
        debug!("POST {url}");
        let ack = self.send_json(self.client.post(&url), Some(request)).await?;
        BackendError::check_ack(ack)
    }

    // ── Scene animation ───────────────────────────────────────────────────

    pub async fn animation(&self, version: &str) -> Result<AnimationDataset, BackendError> {
        self.get(self.url(&format!(
            "/scene-versions/{}/animation",
            urlencoding::encode(version)
        )))
        .await
    }

    pub async fn generate(&self, version: &str) -> Result<AnimationDataset, BackendError> {
        let url = self.url(&format!(
            "/scene-versions/{}/animation/generate",
            urlencoding::encode(version)
        ));
        debug!("POST {url}");
        self.send_json::<(), _>(self.client.post(&url), None).await
    }
}

impl TimelineBackend for ApiClient {
    async fn fetch_timeline(&self, session_id: &str) -> Result<TimelineDataset, BackendError> {
        self.timeline(session_id).await
    }

    async fn fetch_clarified(&self, session_id: &str) -> Result<ClarifiedTimeline, BackendError> {
        self.clarified_timeline(session_id).await
    }

    async fn fetch_disambiguation(
        &self,
        session_id: &str,
    ) -> Result<Option<DisambiguationPrompt>, BackendError> {
        self.disambiguation(session_id).await
    }

    async fn update_event_time(
        &self,
        event_id: &str,
        update: &EventTimeUpdate,
    ) -> Result<WriteAck, BackendError> {
        self.put_event_time(event_id, update).await
    }

    async fn submit_clarification(
        &self,
        request: &ClarificationRequest,
    ) -> Result<WriteAck, BackendError> {
        self.post_clarification(request).await
    }
}

impl AnimationBackend for ApiClient {
    async fn fetch_animation(&self, version: &str) -> Result<AnimationDataset, BackendError> {
        self.animation(version).await
    }

    async fn generate_animation(&self, version: &str) -> Result<AnimationDataset, BackendError> {
        self.generate(version).await
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error containing the status and body text.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}
