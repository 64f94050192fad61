//! Scripted provider: replies with a fixed outcome and records every request.
//!
//! Stands in for the hosted endpoint wherever the pipeline must be exercised
//! without network access. Clones share the same call log.

use std::sync::{Arc, Mutex};

use crate::llm::{ChatMessage, LlmResponse, ProviderError};

#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    outcome: Result<String, ProviderError>,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedProvider {
    /// Always answer `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self { outcome: Ok(text.into()), calls: Arc::default() }
    }

    /// Always fail with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self { outcome: Err(error), calls: Arc::default() }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, ProviderError> {
        self.calls
            .lock()
            .map_err(|_| ProviderError::Request("scripted call log poisoned".into()))?
            .push(messages.to_vec());
        self.outcome.clone().map(LlmResponse::text)
    }

    /// Message lists received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}
