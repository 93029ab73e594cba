//! Google ID-token verification via the token-info endpoint.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::{repo_types::GoogleProfile, services::normalize_email};
use crate::config::GoogleConfig;
use crate::error::{AppError, AppResult};

/// Claims returned by `oauth2.googleapis.com/tokeninfo`.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: Option<String>,
    email: Option<String>,
    /// `"true"` from tokeninfo; a JSON bool is accepted too.
    email_verified: Option<Value>,
    name: Option<String>,
    picture: Option<String>,
    aud: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct GoogleVerifier {
    http: reqwest::Client,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl GoogleVerifier {
    pub fn new(http: reqwest::Client, cfg: &GoogleConfig) -> Self {
        Self {
            http,
            tokeninfo_url: cfg.tokeninfo_url.clone(),
            client_id: cfg.client_id.clone(),
        }
    }

    /// Ask Google for the token's claims. Any provider-reported problem is `InvalidToken`.
    pub async fn verify(&self, id_token: &str) -> AppResult<GoogleProfile> {
        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("google tokeninfo: {e}")))?;

        let status = response.status();
        let info: TokenInfo = response.json().await.map_err(|e| {
            warn!(error = %e, %status, "unreadable tokeninfo response");
            AppError::InvalidToken
        })?;

        if !status.is_success() || info.error.is_some() || info.error_description.is_some() {
            warn!(
                %status,
                error = info.error.as_deref().unwrap_or(""),
                description = info.error_description.as_deref().unwrap_or(""),
                "google rejected id token"
            );
            return Err(AppError::InvalidToken);
        }

        if let Some(expected) = &self.client_id {
            if info.aud.as_deref() != Some(expected.as_str()) {
                warn!(aud = info.aud.as_deref().unwrap_or(""), "id token audience mismatch");
                return Err(AppError::InvalidToken);
            }
        }

        if !is_verified(info.email_verified.as_ref()) {
            warn!("id token email is not verified");
            return Err(AppError::InvalidToken);
        }

        let (Some(sub), Some(email)) = (info.sub, info.email.as_deref().map(normalize_email)) else {
            warn!("id token lacks sub or email");
            return Err(AppError::InvalidToken);
        };

        info!(%sub, "google id token verified");
        Ok(GoogleProfile {
            name: info.name.unwrap_or_else(|| email.clone()),
            sub,
            email,
            picture: info.picture,
        })
    }
}

fn is_verified(flag: Option<&Value>) -> bool {
    match flag {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}
