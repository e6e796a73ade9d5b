//! Remote session API client
//!
//! A WORK phase is mirrored by a server-side session record: opened when the
//! phase starts, closed when it completes. The server answers a completion
//! with gamification data (XP, level-ups, badges) which is only logged here.
//! Profile, badge and statistics documents are fetched as opaque JSON and
//! cached for whoever renders them.

use std::{future::Future, time::Duration};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::SessionApiError;

/// Result of closing a session on the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub xp_earned: u64,
    pub leveled_up: bool,
    pub level: Option<u64>,
    pub new_badges: Vec<String>,
}

/// Remote session bookkeeping
pub trait SessionApi: Send + Sync + 'static {
    /// Open a session for a work phase of `minutes`. `None` means no session
    /// was opened.
    fn start_session(
        &self,
        minutes: u64,
    ) -> impl Future<Output = Result<Option<String>, SessionApiError>> + Send;

    fn complete_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<CompletionOutcome, SessionApiError>> + Send;

    /// XP, level and streak document. `None` when the API is not reachable
    /// by design (offline).
    fn profile(&self) -> impl Future<Output = Result<Option<Value>, SessionApiError>> + Send;

    fn badges(&self) -> impl Future<Output = Result<Option<Value>, SessionApiError>> + Send;

    fn statistics(&self) -> impl Future<Output = Result<Option<Value>, SessionApiError>> + Send;
}

/// Used when no session API is configured. Never opens a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSessionApi;

impl SessionApi for OfflineSessionApi {
    async fn start_session(&self, _minutes: u64) -> Result<Option<String>, SessionApiError> {
        Ok(None)
    }

    async fn complete_session(&self, _session_id: &str) -> Result<CompletionOutcome, SessionApiError> {
        Ok(CompletionOutcome::default())
    }

    async fn profile(&self) -> Result<Option<Value>, SessionApiError> {
        Ok(None)
    }

    async fn badges(&self) -> Result<Option<Value>, SessionApiError> {
        Ok(None)
    }

    async fn statistics(&self) -> Result<Option<Value>, SessionApiError> {
        Ok(None)
    }
}

/// JSON-over-HTTP session API
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
}

impl HttpSessionApi {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SessionApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}{path}` and return the `key` member of the success envelope
    async fn fetch_document(&self, path: &str, key: &str) -> Result<Option<Value>, SessionApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let envelope: Value = self.client.get(&url).send().await?.json().await?;
        unwrap_envelope(envelope, key).map(Some)
    }
}

impl SessionApi for HttpSessionApi {
    async fn start_session(&self, minutes: u64) -> Result<Option<String>, SessionApiError> {
        let url = format!("{}/session/start", self.base_url);
        debug!("POST {} duration={}", url, minutes);

        let response: StartResponse = self
            .client
            .post(&url)
            .json(&json!({ "duration": minutes }))
            .send()
            .await?
            .json()
            .await?;

        response.into_session_id().map(Some)
    }

    async fn complete_session(&self, session_id: &str) -> Result<CompletionOutcome, SessionApiError> {
        let url = format!("{}/session/{}/complete", self.base_url, session_id);
        debug!("POST {}", url);

        let response: CompleteResponse = self.client.post(&url).send().await?.json().await?;
        response.into_outcome()
    }

    async fn profile(&self) -> Result<Option<Value>, SessionApiError> {
        self.fetch_document("/gamification/profile", "profile").await
    }

    async fn badges(&self) -> Result<Option<Value>, SessionApiError> {
        self.fetch_document("/gamification/badges", "badges").await
    }

    async fn statistics(&self) -> Result<Option<Value>, SessionApiError> {
        self.fetch_document("/statistics", "statistics").await
    }
}

/// Check `success` and pull one member out of a response envelope
fn unwrap_envelope(mut envelope: Value, key: &str) -> Result<Value, SessionApiError> {
    if envelope.get("success").and_then(Value::as_bool) != Some(true) {
        let error = envelope.get("error").and_then(Value::as_str).map(str::to_owned);
        return Err(rejected(error));
    }
    envelope
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| SessionApiError::Rejected(format!("response has no {}", key)))
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    success: bool,
    session: Option<SessionRecord>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    id: Value,
}

impl StartResponse {
    fn into_session_id(self) -> Result<String, SessionApiError> {
        if !self.success {
            return Err(rejected(self.error));
        }
        let record = self
            .session
            .ok_or_else(|| SessionApiError::Rejected("response has no session".to_string()))?;
        match record.id {
            Value::String(id) => Ok(id),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(SessionApiError::Rejected(format!("unusable session id: {}", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    success: bool,
    #[serde(default)]
    xp_earned: u64,
    #[serde(default)]
    leveled_up: bool,
    user: Option<UserRecord>,
    #[serde(default)]
    new_badges: Vec<BadgeRecord>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    level: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BadgeRecord {
    name: String,
}

impl CompleteResponse {
    fn into_outcome(self) -> Result<CompletionOutcome, SessionApiError> {
        if !self.success {
            return Err(rejected(self.error));
        }
        Ok(CompletionOutcome {
            xp_earned: self.xp_earned,
            leveled_up: self.leveled_up,
            level: self.user.and_then(|user| user.level),
            new_badges: self.new_badges.into_iter().map(|badge| badge.name).collect(),
        })
    }
}

fn rejected(error: Option<String>) -> SessionApiError {
    SessionApiError::Rejected(error.unwrap_or_else(|| "success=false".to_string()))
}
