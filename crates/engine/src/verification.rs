//! Slip verification.
//!
//! Verification is best-effort: callers treat any error, as well as a
//! rejected [`Verdict`], as "unverified". Implementations must bound their
//! own latency, the approval flow awaits them before opening its
//! transaction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;

use crate::{EngineError, ResultEngine, storage::StoredFile};

/// Outcome of a verification call that reached the verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    /// Structured data returned by the verifier, kept verbatim.
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait SlipVerifier: Send + Sync + std::fmt::Debug {
    /// Errors are always [`EngineError::UpstreamDegraded`].
    async fn verify(&self, file: &StoredFile) -> ResultEngine<Verdict>;
}

/// Used when no verifier is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledVerifier;

#[async_trait]
impl SlipVerifier for DisabledVerifier {
    async fn verify(&self, _file: &StoredFile) -> ResultEngine<Verdict> {
        Err(EngineError::UpstreamDegraded(
            "verification disabled".to_string(),
        ))
    }
}

pub const SLIPOK_DEFAULT_BASE_URL: &str = "https://api.slipok.com/api/line/apikey";

#[derive(Clone, Debug)]
pub struct SlipOkConfig {
    pub api_key: String,
    pub branch_id: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl SlipOkConfig {
    pub fn new(api_key: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            branch_id: branch_id.into(),
            base_url: SLIPOK_DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// SlipOK response envelope. Only the success flags are interpreted; the
/// `data` object is kept as-is.
#[derive(Debug, Deserialize)]
struct SlipOkResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
}

impl SlipOkResponse {
    fn into_verdict(self) -> Verdict {
        let data_success = self
            .data
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        Verdict {
            accepted: self.success && data_success,
            payload: self.data,
        }
    }
}

/// Client for the SlipOK slip-verification API.
#[derive(Clone, Debug)]
pub struct SlipOkVerifier {
    client: Client,
    config: SlipOkConfig,
}

impl SlipOkVerifier {
    pub fn new(config: SlipOkConfig) -> ResultEngine<Self> {
        if config.api_key.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "slipok api key must not be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| EngineError::InvalidArgument(format!("slipok client: {err}")))?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.branch_id.trim_start_matches('/')
        )
    }
}

fn degraded(err: impl std::fmt::Display) -> EngineError {
    EngineError::UpstreamDegraded(format!("slipok: {err}"))
}

#[async_trait]
impl SlipVerifier for SlipOkVerifier {
    async fn verify(&self, file: &StoredFile) -> ResultEngine<Verdict> {
        let bytes = tokio::fs::read(&file.path).await.map_err(degraded)?;
        let file_name = file
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "slip".to_string());
        let form = Form::new().part("files", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.url())
            .header("x-authorization", &self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(degraded)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(degraded(format!("status {status}: {body}")));
        }

        let parsed = response.json::<SlipOkResponse>().await.map_err(degraded)?;
        Ok(parsed.into_verdict())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn verdict_requires_both_success_flags() {
        let accepted = SlipOkResponse {
            success: true,
            data: json!({"success": true, "transRef": "0123"}),
        }
        .into_verdict();
        assert!(accepted.accepted);
        assert_eq!(accepted.payload["transRef"], "0123");

        let inner_failed = SlipOkResponse {
            success: true,
            data: json!({"success": false, "message": "not a slip"}),
        }
        .into_verdict();
        assert!(!inner_failed.accepted);

        let outer_failed = SlipOkResponse {
            success: false,
            data: json!({"success": true}),
        }
        .into_verdict();
        assert!(!outer_failed.accepted);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = SlipOkVerifier::new(SlipOkConfig::new("  ", "branch")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn url_joins_branch() {
        let verifier = SlipOkVerifier::new(
            SlipOkConfig::new("key", "12345").base_url("http://localhost:9/api/"),
        )
        .unwrap();
        assert_eq!(verifier.url(), "http://localhost:9/api/12345");
    }
}
