//! HTTP-backed judge client.
//!
//! Posts a JSON envelope `{model, question, candidate}` to a completion
//! endpoint and returns the raw reply text. Transport failures are retried
//! under the engine's retry policy; reply parsing stays the filter's job.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{QfError, Result};
use crate::retry::{RetryConfig, with_retry_if};

use super::Judge;

/// Connection settings for [`HttpJudge`].
#[derive(Debug, Clone)]
pub struct HttpJudgeConfig {
    pub endpoint: String,
    pub model: String,
    /// Transport-level timeout; the evidence filter applies its own
    /// per-call deadline on top.
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for HttpJudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/v1/judge".to_string(),
            model: "default".to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JudgeReply {
    /// Raw reply text. Endpoints differ on the field name; accept both.
    #[serde(alias = "content", alias = "text")]
    reply: Option<String>,
    error: Option<Value>,
}

pub struct HttpJudge {
    config: HttpJudgeConfig,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HttpJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJudge")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl HttpJudge {
    pub fn new(config: HttpJudgeConfig) -> Result<Self> {
        if config.endpoint.starts_with("http://") {
            tracing::warn!("judge endpoint uses unencrypted HTTP");
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout.max(Duration::from_secs(1)))
            .build()
            .map_err(|err| QfError::Config(format!("judge http client: {err}")))?;

        Ok(Self { config, client })
    }

    fn post_once(&self, question: &str, candidate_text: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "question": question,
            "candidate": candidate_text,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .map_err(|err| QfError::Http(format!("judge request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QfError::Http(format!("judge HTTP {status}")));
        }

        let reply: JudgeReply = response
            .json()
            .map_err(|err| QfError::JudgeCall(format!("judge response decode: {err}")))?;

        if let Some(error) = reply.error {
            return Err(QfError::JudgeCall(format!("judge error: {error}")));
        }

        reply
            .reply
            .ok_or_else(|| QfError::JudgeCall("judge reply missing content".to_string()))
    }
}

impl Judge for HttpJudge {
    fn evaluate(&self, question: &str, candidate_text: &str) -> Result<String> {
        with_retry_if(
            &self.config.retry,
            || self.post_once(question, candidate_text),
            QfError::is_transient,
        )
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
