//! Chat prompt templates with named substitution slots.
//!
//! A template is an ordered list of turns, each a role plus template text.
//! Slots use `{{name}}` syntax and are parsed once at construction, so
//! [`render`](ChatPromptTemplate::render) is a single pass that inserts each
//! value verbatim. Values are never escaped, trimmed, or scanned for slots of
//! their own.
//!
//! ```text
//! system: you are a chat bot
//! user:   question:{{question}}
//! ```

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::llm::{ChatMessage, Role};

/// Built-in system instruction.
pub const DEFAULT_SYSTEM: &str = "you are a chat bot";
/// Built-in human turn.
pub const DEFAULT_HUMAN: &str = "question:{{question}}";
/// Slot name the pipeline fills with the user's input.
pub const QUESTION_VAR: &str = "question";

/// Variable bindings passed to [`ChatPromptTemplate::render`].
pub type Variables = HashMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("missing template variable '{0}'")]
    MissingVariable(String),
    #[error("unterminated slot at byte {0}")]
    UnterminatedSlot(usize),
    #[error("invalid slot name '{0}'")]
    InvalidSlot(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

#[derive(Debug, Clone)]
struct Turn {
    role: Role,
    segments: Vec<Segment>,
}

/// An immutable multi-turn prompt skeleton.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    turns: Vec<Turn>,
}

impl ChatPromptTemplate {
    /// Parse a template from `(role, text)` turns.
    pub fn from_messages<I, S>(turns: I) -> Result<Self, PromptError>
    where
        I: IntoIterator<Item = (Role, S)>,
        S: AsRef<str>,
    {
        let turns = turns
            .into_iter()
            .map(|(role, text)| {
                Ok(Turn {
                    role,
                    segments: parse_segments(text.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>, PromptError>>()?;
        Ok(Self { turns })
    }

    /// The built-in two-turn question template.
    pub fn default_question() -> Self {
        Self {
            turns: vec![
                Turn {
                    role: Role::System,
                    segments: vec![Segment::Text(DEFAULT_SYSTEM.to_string())],
                },
                Turn {
                    role: Role::User,
                    segments: vec![
                        Segment::Text("question:".to_string()),
                        Segment::Slot(QUESTION_VAR.to_string()),
                    ],
                },
            ],
        }
    }

    /// Sorted, de-duplicated slot names across all turns.
    pub fn input_variables(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .turns
            .iter()
            .flat_map(|t| t.segments.iter())
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Substitute `vars` into every turn.
    ///
    /// Fails on the first slot without a binding; bindings with no matching
    /// slot are ignored.
    pub fn render(&self, vars: &Variables) -> Result<Vec<ChatMessage>, PromptError> {
        self.turns
            .iter()
            .map(|turn| {
                let mut content = String::new();
                for segment in &turn.segments {
                    match segment {
                        Segment::Text(text) => content.push_str(text),
                        Segment::Slot(name) => {
                            let value = vars
                                .get(name)
                                .ok_or_else(|| PromptError::MissingVariable(name.clone()))?;
                            content.push_str(value);
                        }
                    }
                }
                Ok(ChatMessage::new(turn.role, content))
            })
            .collect()
    }
}

impl Default for ChatPromptTemplate {
    fn default() -> Self {
        Self::default_question()
    }
}

fn parse_segments(text: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or(PromptError::UnterminatedSlot(offset + open))?;
        let name = after_open[..close].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PromptError::InvalidSlot(name.to_string()));
        }
        segments.push(Segment::Slot(name.to_string()));

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}
