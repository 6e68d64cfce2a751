//! Chat-completion analysis client.
//!
//! Wraps one conversation + the rubric prompt into a single
//! request/response exchange with an OpenAI-compatible endpoint. Failures
//! are retried with exponential backoff up to an attempt ceiling; a 429
//! waits for the server's `Retry-After` hint instead of the backoff curve.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lens_core::ConversationRecord;

use crate::error::ClientError;
use crate::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::rate::RateGate;

/// Anything that can turn a conversation into rubric report text.
///
/// The seam between the orchestrator and the network: production uses
/// [`ChatClient`], tests use scripted stubs.
pub trait Analyze: Send + Sync {
    fn analyze(
        &self,
        conv: &ConversationRecord,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// Connection and retry settings for [`ChatClient`].
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    /// Per-request timeout, separate from the retry ceiling.
    pub timeout: Duration,
    /// Attempt ceiling, including the initial attempt.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_prompt_tokens: usize,
    /// Shared outbound ceiling; see [`RateGate`].
    pub requests_per_second: f64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_prompt_tokens: 120_000,
            requests_per_second: 2.0,
        }
    }
}

/// One analysis endpoint, shared by all workers of a run.
#[derive(Debug)]
pub struct ChatClient {
    http: reqwest::Client,
    options: ClientOptions,
    prompt: PromptBuilder,
    gate: RateGate,
}

impl ChatClient {
    /// Build a client, validating that an API key is present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingApiKey`] when the key is empty, or
    /// [`ClientError::Http`] when the HTTP client cannot be constructed.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        if options.api_key.is_empty() {
            return Err(ClientError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;
        Ok(Self {
            http,
            prompt: PromptBuilder::new(options.max_prompt_tokens),
            gate: RateGate::new(options.requests_per_second),
            options,
        })
    }

    /// Analyze one conversation, retrying retryable failures.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Exhausted`] after the attempt ceiling, or the
    /// first non-retryable error as-is.
    pub async fn analyze_conversation(
        &self,
        conv: &ConversationRecord,
    ) -> Result<String, ClientError> {
        let transcript = self.prompt.build(conv);
        let request = ChatRequest {
            model: &self.options.model,
            temperature: self.options.temperature,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                WireMessage {
                    role: "user",
                    content: &transcript,
                },
            ],
        };

        let id = conv.id.as_str();
        retry(
            self.options.max_attempts,
            self.options.base_delay,
            self.options.max_delay,
            |attempt| {
                debug!(conversation_id = id, attempt, "sending analysis request");
                self.request_once(&request)
            },
        )
        .await
    }

    async fn request_once(&self, request: &ChatRequest<'_>) -> Result<String, ClientError> {
        self.gate.acquire().await;
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.options.base_url))
            .bearer_auth(&self.options.api_key)
            .json(request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let completion: ChatResponse = resp.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or(ClientError::EmptyResponse)
    }
}

impl Analyze for ChatClient {
    fn analyze(
        &self,
        conv: &ConversationRecord,
    ) -> impl Future<Output = Result<String, ClientError>> + Send {
        self.analyze_conversation(conv)
    }
}

/// Run `op` up to `max_attempts` times, sleeping between retryable
/// failures. A 429 uses the server's retry hint; everything else follows
/// the capped exponential backoff curve.
async fn retry<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    mut op: F,
) -> Result<T, ClientError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                let delay = match &error {
                    ClientError::RateLimited { retry_after_secs } => {
                        Duration::from_secs(*retry_after_secs)
                    }
                    _ => backoff_delay(attempt, base_delay, max_delay),
                };
                warn!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying analysis request");
                tokio::time::sleep(delay).await;
            }
            Err(error) if error.is_retryable() => {
                return Err(ClientError::Exhausted {
                    attempts: attempt,
                    last: error.to_string(),
                });
            }
            Err(error) => return Err(error),
        }
    }
}

/// `base * 2^(attempt-1)`, capped at `max`.
fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .min(max)
}

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`ClientError::RateLimited`] with
///   `Retry-After` header parsing (falls back to 60 s if absent or
///   unparseable).
/// - **Non-success status** → [`ClientError::Api`] with status code and
///   response body.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if resp.status() == 429 {
        let retry_after = parse_retry_after(&resp);
        return Err(ClientError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    if !resp.status().is_success() {
        return Err(ClientError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    const FIXTURE: &str = r##"{
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "# 1. Brief Summary\nThe user iterated well."
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200}
    }"##;

    #[test]
    fn parse_completion_response() {
        let data: ChatResponse = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(data.choices.len(), 1);
        assert_eq!(
            data.choices[0].message.content.as_deref(),
            Some("# 1. Brief Summary\nThe user iterated well.")
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(10);
        assert_eq!(backoff_delay(1, base, max), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, base, max), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, base, max), Duration::from_secs(4));
        assert_eq!(backoff_delay(6, base, max), Duration::from_secs(10));
    }

    fn mock_response(status: u16) -> reqwest::Response {
        reqwest::Response::from(::http::Response::builder().status(status).body("").unwrap())
    }

    fn mock_response_with_retry_after(status: u16, value: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .header("Retry-After", value)
                .body("")
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn check_response_rate_limited_with_header() {
        let resp = mock_response_with_retry_after(429, "30");
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::RateLimited {
                retry_after_secs: 30
            }
        ));
    }

    #[tokio::test]
    async fn check_response_rate_limited_default() {
        let resp = mock_response_with_retry_after(429, "not-a-number");
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::RateLimited {
                retry_after_secs: 60
            }
        ));
    }

    #[tokio::test]
    async fn check_response_api_error_and_success() {
        let err = check_response(mock_response(500)).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 500, .. }));
        assert!(check_response(mock_response(200)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_on_third_attempt_with_three_calls() {
        let calls = AtomicU32::new(0);
        let result = retry(
            3,
            Duration::from_millis(10),
            Duration::from_secs(1),
            |_attempt| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(ClientError::Api {
                            status: 503,
                            message: "busy".to_string(),
                        })
                    } else {
                        Ok("report text".to_string())
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "report text");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_reports_attempts_and_cause() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = retry(
            3,
            Duration::from_millis(10),
            Duration::from_secs(1),
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ClientError::RateLimited {
                        retry_after_secs: 1,
                    })
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            ClientError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("rate limited"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = retry(
            3,
            Duration::from_millis(10),
            Duration::from_secs(1),
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ClientError::Api {
                        status: 401,
                        message: "bad key".to_string(),
                    })
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            ClientError::Api { status: 401, .. }
        ));
    }

    #[test]
    fn missing_api_key_is_rejected_up_front() {
        let err = ChatClient::new(ClientOptions::default()).unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey));
    }
}
