//! Forwards chat messages to the automation webhook and passes its reply back.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};

use crate::auth::repo_types::PublicUser;
use crate::config::ChatConfig;
use crate::error::{AppError, AppResult};

/// Outbound envelope posted to the webhook.
#[derive(Debug, Serialize)]
pub struct RelayPayload<'a> {
    pub message: &'a str,
    pub user_id: &'a str,
    pub user: Option<&'a PublicUser>,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct ChatRelay {
    http: reqwest::Client,
    webhook_url: Option<String>,
    timeout: Duration,
}

impl ChatRelay {
    pub fn new(http: reqwest::Client, cfg: &ChatConfig) -> Self {
        Self {
            http,
            webhook_url: cfg.webhook_url.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    /// Single attempt, no retries. The webhook's body comes back as-is when it is JSON,
    /// otherwise wrapped as `{"response": <text>}`.
    pub async fn relay(
        &self,
        message: &str,
        user_id: &str,
        user: Option<&PublicUser>,
    ) -> AppResult<Value> {
        if message.trim().is_empty() {
            return Err(AppError::validation("Message is required"));
        }
        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| AppError::Upstream("chat webhook is not configured".into()))?;

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| AppError::Store(e.into()))?;
        let payload = RelayPayload {
            message,
            user_id,
            user,
            timestamp,
        };

        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("webhook responded {status}")));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        let body = response.text().await.map_err(upstream)?;
        debug!(%status, is_json, bytes = body.len(), "webhook replied");
        info!(%user_id, "chat message relayed");

        Ok(normalize_reply(&body, is_json))
    }
}

fn upstream(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::UpstreamTimeout
    } else {
        AppError::Upstream(e.to_string())
    }
}

fn normalize_reply(body: &str, is_json: bool) -> Value {
    if is_json {
        if let Ok(v) = serde_json::from_str::<Value>(body) {
            return v;
        }
    }
    json!({ "response": body })
}
