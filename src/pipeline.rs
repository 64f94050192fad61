//! Prompt → model → string pipeline.
//!
//! [`Pipeline::invoke`] renders the template, makes one logical remote call
//! (the provider owns its retries) and extracts the reply text.
//! [`Pipeline::answer`] is the single entry point the front ends use.

use thiserror::Error;
use tracing::{debug, info_span, Instrument};

use crate::llm::{LlmProvider, LlmResponse, ProviderError};
use crate::prompt::{ChatPromptTemplate, PromptError, QUESTION_VAR, Variables};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("remote call failed: {0}")]
    Remote(#[from] ProviderError),
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Remote(ProviderError::Timeout))
    }
}

/// Reduces a structured model response to its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl StrOutputParser {
    pub fn parse(&self, response: LlmResponse) -> String {
        response.text
    }
}

/// Template, provider and parser composed into one callable unit.
#[derive(Debug, Clone)]
pub struct Pipeline {
    prompt: ChatPromptTemplate,
    provider: LlmProvider,
    parser: StrOutputParser,
}

impl Pipeline {
    pub fn new(prompt: ChatPromptTemplate, provider: LlmProvider) -> Self {
        Self { prompt, provider, parser: StrOutputParser }
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Render `vars`, call the model, return the parsed text.
    pub async fn invoke(&self, vars: &Variables) -> Result<String, PipelineError> {
        let messages = self.prompt.render(vars)?;
        let response = self.provider.complete(&messages).await?;
        if let Some(usage) = response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "llm usage"
            );
        }
        Ok(self.parser.parse(response))
    }

    /// Invoke with exactly `{question: question}`.
    pub async fn answer(&self, question: &str) -> Result<String, PipelineError> {
        let vars = Variables::from([(QUESTION_VAR.to_string(), question.to_string())]);
        let request_id = uuid::Uuid::now_v7();
        self.invoke(&vars)
            .instrument(info_span!("answer", %request_id, provider = self.provider.name()))
            .await
    }
}
