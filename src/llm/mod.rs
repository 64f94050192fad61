//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities, cheap to clone.
//! Enum dispatch keeps `complete` a plain `async fn` so callers need no
//! trait-object machinery, and tests substitute the `Scripted` variant for a
//! real endpoint.

pub mod providers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("no API key configured (set GOOGLE_API_KEY or LLM_API_KEY)")]
    MissingApiKey,
    #[error("request timed out")]
    Timeout,
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

impl ProviderError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout
            | ProviderError::RateLimited(_)
            | ProviderError::Transport(_) => true,
            ProviderError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// Speaker of a chat turn. Serialises to the lowercase wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One rendered chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Token counts reported by the endpoint, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Structured reply from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), usage: None }
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Scripted(providers::scripted::ScriptedProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `messages` to the provider and return its reply.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(messages).await,
            LlmProvider::Scripted(p) => p.complete(messages).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(messages).await,
        }
    }

    /// Reachability probe. Local providers are always reachable.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Dummy(_) | LlmProvider::Scripted(_) => Ok(()),
            LlmProvider::OpenAiCompatible(p) => p.ping().await,
        }
    }

    /// Short backend name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Scripted(_) => "scripted",
            LlmProvider::OpenAiCompatible(_) => "openai-compatible",
        }
    }
}
