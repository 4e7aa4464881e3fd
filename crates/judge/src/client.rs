//! Judge-model client.
//!
//! [`JudgeModel`] is the seam the pipeline depends on; tests swap in a
//! scripted implementation. [`HttpJudgeClient`] speaks an
//! OpenAI-compatible chat-completions wire format and retries transient
//! failures with exponential backoff. It returns the raw response body:
//! envelope handling belongs to the extractors, since different
//! deployments wrap the payload differently.

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::warn;

use crate::error::JudgeError;

/// Any text-completion service usable as a judge.
#[async_trait::async_trait]
pub trait JudgeModel: Send + Sync {
    /// Send a system + user prompt pair, return the raw response body.
    async fn complete(&self, system: &str, user: &str) -> Result<String, JudgeError>;
}

/// Connection settings for the HTTP judge client.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Bearer token
    pub api_key: String,
    /// Model identifier sent in the request body
    pub model: String,
    /// Completion token cap
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries on transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
}

impl JudgeConfig {
    /// Read the configuration from `EXAMSWEEP_JUDGE_URL`,
    /// `EXAMSWEEP_JUDGE_KEY` and `EXAMSWEEP_JUDGE_MODEL`. Returns `None`
    /// when the URL or key is absent; the sweep then runs precheck-only.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("EXAMSWEEP_JUDGE_URL").ok()?;
        let api_key = std::env::var("EXAMSWEEP_JUDGE_KEY").ok()?;
        let model = std::env::var("EXAMSWEEP_JUDGE_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Some(Self {
            endpoint,
            api_key,
            model,
            ..Self::defaults()
        })
    }

    fn defaults() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: String::new(),
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    stream: bool,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// HTTP judge client over an OpenAI-compatible chat-completions API.
pub struct HttpJudgeClient {
    client: reqwest::Client,
    config: JudgeConfig,
}

impl HttpJudgeClient {
    /// Build a client from its configuration.
    pub fn new(config: JudgeConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build a client from the environment, when configured.
    pub fn from_env() -> Result<Self, JudgeError> {
        let config = JudgeConfig::from_env().ok_or(JudgeError::NotConfigured)?;
        Self::new(config)
    }

    async fn send_once(&self, system: &str, user: &str) -> Result<String, JudgeError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.config.max_tokens,
            stream: false,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(JudgeError::Api {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl JudgeModel for HttpJudgeClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, JudgeError> {
        let mut attempt = 0;
        loop {
            match self.send_once(system, user).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    if !err.is_retryable() || attempt >= self.config.max_retries {
                        return Err(err);
                    }

                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying judge call"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.pow(attempt.min(5))
}

/// Truncate a string on a char boundary for log/error payloads.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(400));
        // Exponent capped
        assert_eq!(backoff_delay(base, 50), Duration::from_millis(3200));
    }

    #[test]
    fn retryable_classification() {
        assert!(JudgeError::Api {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(JudgeError::Api {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!JudgeError::Api {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!JudgeError::Parse("bad".to_string()).is_retryable());
        assert!(!JudgeError::NotConfigured.is_retryable());
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("clínica", 20), "clínica");
        assert_eq!(truncate("clínica", 3), "clí");
    }
}
