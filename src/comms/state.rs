//! Shared state for the presentation channels.
//!
//! Channels receive an `Arc<AskState>` and drive it through one event
//! handler, [`AskState::handle_input`], bound to their submit event. The
//! handler decides whether a remote call happens at all and turns the outcome
//! into a [`Display`] the channel renders.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::llm::LlmProvider;
use crate::pipeline::Pipeline;

/// Longest error text handed to a channel. Upstream bodies can be large.
pub const MAX_ERROR_CHARS: usize = 300;

/// What a channel shows below the input after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Display {
    /// Nothing submitted: show the title and the empty input only.
    Empty,
    /// Text returned by the model.
    Answer(String),
    /// Remote call failed. `message` is the upstream error text, cut to
    /// [`MAX_ERROR_CHARS`]; it is meant for operators and API clients, and
    /// the page shows only a generic line.
    Error { message: String, timed_out: bool },
}

/// Application context shared by every channel.
#[derive(Debug)]
pub struct AskState {
    title: String,
    input_label: String,
    pipeline: Pipeline,
}

impl AskState {
    pub fn new(title: impl Into<String>, input_label: impl Into<String>, pipeline: Pipeline) -> Self {
        Self {
            title: title.into(),
            input_label: input_label.into(),
            pipeline,
        }
    }

    /// Wire the configured template to an already-built provider.
    pub fn from_config(config: &Config, provider: LlmProvider) -> Self {
        Self::new(
            config.title.clone(),
            config.input_label.clone(),
            Pipeline::new(config.prompt.clone(), provider),
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn input_label(&self) -> &str {
        &self.input_label
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Submit handler. An empty input makes no remote call; anything else is
    /// passed to the pipeline unchanged.
    pub async fn handle_input(&self, input: &str) -> Display {
        if input.is_empty() {
            debug!("empty input, nothing to answer");
            return Display::Empty;
        }

        info!(question_len = input.len(), "answering question");
        match self.pipeline.answer(input).await {
            Ok(text) => Display::Answer(text),
            Err(e) => {
                warn!(error = %e, "question could not be answered");
                Display::Error {
                    message: truncate_chars(e.to_string(), MAX_ERROR_CHARS),
                    timed_out: e.is_timeout(),
                }
            }
        }
    }
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max) {
        text.truncate(cut);
        text.push('…');
    }
    text
}
