use crate::config::GrammarBotConfig;
use crate::error::CheckError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Upper bound on how much of an upstream error body is kept
const MAX_ERROR_BODY_BYTES: usize = 512;

/// Something that can grammar-check a piece of text.
///
/// `text` is optional because a request without one may still be forwarded
/// in passthrough mode; implementations decide what an absent text means.
#[async_trait]
pub trait GrammarChecker: Send + Sync {
    async fn check(&self, text: Option<&str>) -> Result<Value, CheckError>;
}

#[derive(Clone)]
pub struct GrammarBotClient {
    base_url: String,
    api_key: String,
    language: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GrammarBotClient {
    pub fn new(config: &GrammarBotConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            timeout: config.timeout(),
            client,
        })
    }

    pub fn check_url(&self) -> String {
        format!("{}/check", self.base_url)
    }

    /// The request URL carries the API key and the user's text in its
    /// query, so it is stripped before the error is formatted.
    fn map_send_error(&self, e: reqwest::Error) -> CheckError {
        if e.is_timeout() {
            return CheckError::Timeout {
                secs: self.timeout.as_secs(),
            };
        }

        let e = e.without_url();
        let mut reason = format!("{} ({})", e, self.check_url());
        if let Some(source) = std::error::Error::source(&e) {
            reason.push_str(": ");
            reason.push_str(&source.to_string());
        }
        CheckError::Unreachable { reason }
    }
}

#[async_trait]
impl GrammarChecker for GrammarBotClient {
    async fn check(&self, text: Option<&str>) -> Result<Value, CheckError> {
        let mut params = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        if let Some(text) = text {
            params.push(("text", text));
        }

        debug!(target: "grammarbot", "GET {}", self.check_url());

        let response = self
            .client
            .get(self.check_url())
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(CheckError::UpstreamStatus {
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY_BYTES),
            });
        }

        serde_json::from_str(&body).map_err(|e| CheckError::InvalidBody {
            reason: e.to_string(),
        })
    }
}

/// Cut an upstream error body to at most `max` bytes on a char boundary
fn truncate_body(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Number of entries in the result's `matches` array, if it has one
pub fn match_count(result: &Value) -> Option<usize> {
    result.get("matches").and_then(Value::as_array).map(Vec::len)
}
