//! OpenAI-compatible chat completion provider (`/chat/completions`).
//!
//! Serves both the hosted Gemini endpoint (which speaks the OpenAI wire
//! format under `/v1beta/openai/`) and plain OpenAI or local servers. All wire
//! types are private to this module; callers see [`ChatMessage`] in and
//! [`LlmResponse`] out.
//!
//! Retries live here: transport failures, timeouts, HTTP 429 and HTTP 5xx are
//! retried up to `max_retries` extra times with doubling backoff.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::config::ModelConfig;
use crate::llm::{ChatMessage, LlmResponse, LlmUsage, ProviderError};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);
const PING_TIMEOUT: Duration = Duration::from_secs(5);

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/chat/completions`.
///
/// Constructed once at startup, then cheaply cloned because `reqwest::Client`
/// is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: ModelConfig,
    api_key: Option<String>,
    backoff: Duration,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from its model config and an optional API key.
    ///
    /// When present the key is sent as `Authorization: Bearer <key>` on every
    /// request. A `None` timeout leaves requests unbounded.
    pub fn new(config: ModelConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config, api_key, backoff: DEFAULT_BACKOFF })
    }

    /// Override the base retry delay.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Lightweight reachability probe.
    ///
    /// Sends a HEAD request to the configured endpoint. Any HTTP response
    /// (including 4xx) means the server is reachable; only a transport-level
    /// failure counts as unreachable.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        let client = Client::builder()
            .timeout(PING_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build ping client: {e}")))?;
        let mut req = client.head(&self.config.api_base_url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Transport(format!("unreachable: {e}")))
    }

    /// One logical completion: the first attempt plus up to `max_retries`
    /// retries for transient failures.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ProviderError> {
        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            model = %payload.model,
            temperature = payload.temperature,
            max_tokens = ?payload.max_tokens,
            messages = messages.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut attempt = 0;
        loop {
            match self.send_once(&payload).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(self.backoff, attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "LLM request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, payload: &ChatCompletionRequest<'_>) -> Result<LlmResponse, ProviderError> {
        let mut req = self.client.post(&self.config.api_base_url).json(payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.config.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Malformed(format!("failed to parse response body: {e}"))
            }
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&parsed)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(response = %json, "full LLM response payload");
        }

        // Content is returned verbatim; an empty string is a valid answer.
        let text = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("response has no choices".into()))?
            .message
            .content
            .ok_or_else(|| ProviderError::Malformed("missing content in response".into()))?;

        let usage = parsed.usage.map(|u| LlmUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(LlmResponse { text, usage })
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16)).min(MAX_BACKOFF)
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UsageData {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// OpenAI answers errors with one envelope; the Gemini compatibility layer
// wraps the same envelope in a single-element list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBodyShape {
    Single(ErrorEnvelope),
    List(Vec<ErrorEnvelope>),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

fn error_message(body: &str) -> String {
    let envelope = match serde_json::from_str::<ErrorBodyShape>(body) {
        Ok(ErrorBodyShape::Single(env)) => Some(env),
        Ok(ErrorBodyShape::List(list)) => list.into_iter().next(),
        Err(_) => None,
    };
    match envelope {
        Some(env) => {
            let code = env
                .error
                .code
                .map(|v| match v {
                    serde_json::Value::String(s) => format!(" [code={s}]"),
                    other => format!(" [code={other}]"),
                })
                .unwrap_or_default();
            format!("{}{code}", env.error.message)
        }
        None => body.trim().to_string(),
    }
}

/// Return the response if successful, or consume it into a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = error_message(&body);

    error!(%status, %message, "LLM request returned HTTP error");
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Err(ProviderError::RateLimited(message))
    } else {
        Err(ProviderError::Http { status: status.as_u16(), message })
    }
}
