// src/audit/remote.rs

//! HTTP client for the remote audit service.
//!
//! Every response is a JSON envelope `{"data": {...}, "message": "..."}`.
//! A `data.status` above 399 is an error the service handled itself and
//! must stop local progress tracking; anything that prevents decoding an
//! envelope (network failure, non-JSON body) is transient and leaves local
//! state alone.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{IssueSeverity, RemoteConfig};

/// Reply to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartReply {
    /// The audit was queued remotely
    Queued,

    /// The service requires a cooldown before the next run
    Cooldown { retry_after_secs: u64 },
}

/// Progress of the remotely executing audit.
#[derive(Debug, Clone, Default)]
pub struct RemoteProgress {
    pub progress_percent: u8,
    pub complete: bool,
}

/// One finding as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteIssue {
    /// Report topic the finding belongs to (e.g. "links", "meta")
    #[serde(default)]
    pub topic: String,

    pub id: String,

    #[serde(default)]
    pub severity: IssueSeverity,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: Option<String>,
}

/// Client contract for the audit service. Mockable in tests.
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// Ask the service to start an audit of this site.
    async fn start(&self) -> Result<StartReply>;

    /// Fetch the progress of the current run.
    async fn status(&self) -> Result<RemoteProgress>;

    /// Fetch the findings of the completed run.
    async fn result(&self) -> Result<Vec<RemoteIssue>>;

    /// Push the full ignore set so the remote suppression list matches ours.
    async fn sync_ignores(&self, ids: &[String]) -> Result<()>;

    /// Ask the service to dispatch the report emails.
    async fn request_emails(&self) -> Result<()>;
}

/// JSON envelope wrapping every API response.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: serde_json::Value,

    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    /// Surface a `data.status` above 399 as a handled API error.
    fn checked(self) -> Result<Self> {
        let status = self.data.get("status").and_then(|v| v.as_u64()).unwrap_or(0);
        if status > 399 {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| "unspecified error".to_string());
            return Err(AppError::api_handled(status.min(u16::MAX as u64) as u16, message));
        }
        Ok(self)
    }

    fn data_u64(&self, field: &str) -> Option<u64> {
        self.data.get(field).and_then(|v| v.as_u64())
    }

    fn data_bool(&self, field: &str) -> bool {
        self.data
            .get(field)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// reqwest-backed [`AuditApi`] implementation.
pub struct HttpAuditClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpAuditClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, verb: &str) -> String {
        format!("{}/{}", self.base_url, verb)
    }

    async fn decode(verb: &str, response: reqwest::Response) -> Result<Envelope> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::remote(verb, e))?;
        let envelope: Envelope = serde_json::from_str(&text).map_err(|_| {
            AppError::remote(verb, format!("unexpected response (HTTP {})", status.as_u16()))
        })?;
        envelope.checked()
    }

    async fn call_get(&self, verb: &str) -> Result<Envelope> {
        let response = self
            .client
            .get(self.url(verb))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::remote(verb, e))?;
        Self::decode(verb, response).await
    }

    async fn call_post(&self, verb: &str, form: &[(&str, String)]) -> Result<Envelope> {
        let response = self
            .client
            .post(self.url(verb))
            .bearer_auth(&self.token)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::remote(verb, e))?;
        Self::decode(verb, response).await
    }
}

#[async_trait]
impl AuditApi for HttpAuditClient {
    async fn start(&self) -> Result<StartReply> {
        let envelope = self
            .call_post("start", &[("trigger", "operator".to_string())])
            .await?;
        if let Some(cooldown) = envelope.data_u64("cooldown") {
            return Ok(StartReply::Cooldown {
                retry_after_secs: cooldown,
            });
        }
        Ok(StartReply::Queued)
    }

    async fn status(&self) -> Result<RemoteProgress> {
        let envelope = self.call_get("status").await?;
        Ok(RemoteProgress {
            progress_percent: envelope.data_u64("progress").unwrap_or(0).min(100) as u8,
            complete: envelope.data_bool("complete"),
        })
    }

    async fn result(&self) -> Result<Vec<RemoteIssue>> {
        let envelope = self.call_get("result").await?;
        match envelope.data.get("issues") {
            Some(issues) => Ok(serde_json::from_value(issues.clone())?),
            None => Ok(Vec::new()),
        }
    }

    async fn sync_ignores(&self, ids: &[String]) -> Result<()> {
        self.call_post("sync", &[("ignored", ids.join(","))]).await?;
        Ok(())
    }

    async fn request_emails(&self) -> Result<()> {
        self.call_get("emails").await?;
        Ok(())
    }
}
