//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! the file named by `ASKBOT_CONFIG`), then applies `ASKBOT_LOG_LEVEL` and
//! `ASKBOT_BIND` overrides. Every key is optional; when the default file is
//! absent the built-in defaults are used. The API key is read from
//! `GOOGLE_API_KEY`, falling back to `LLM_API_KEY`, and never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::llm::Role;
use crate::prompt::{self, ChatPromptTemplate};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Remote model settings. Constructed once at startup, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature, sent with every request.
    pub temperature: f32,
    /// Output token cap; `None` leaves it to the endpoint.
    pub max_tokens: Option<u32>,
    /// Per-request HTTP timeout; `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
}

impl Default for ModelConfig {
    /// Hosted Gemini through its OpenAI-compatible endpoint.
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
                .to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.0,
            max_tokens: Some(500),
            timeout_seconds: None,
            max_retries: 2,
        }
    }
}

impl ModelConfig {
    fn openai_default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: Some(500),
            timeout_seconds: Some(60),
            max_retries: 2,
        }
    }
}

/// LLM configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Which provider is active (`"gemini"`, `"openai"` or `"dummy"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    /// Probe the endpoint once at startup and log the outcome.
    pub ping_on_start: bool,
    /// `[llm.gemini]`
    pub gemini: ModelConfig,
    /// `[llm.openai]`
    pub openai: ModelConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            ping_on_start: false,
            gemini: ModelConfig::default(),
            openai: ModelConfig::openai_default(),
        }
    }
}

/// Which front end serves the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Web,
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiConfig {
    pub channel: ChannelKind,
    /// Socket address for the web channel.
    pub bind: String,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page title.
    pub title: String,
    /// Label shown on the question input.
    pub input_label: String,
    pub log_level: String,
    /// Append logs here instead of stderr (already expanded, no `~`).
    pub log_file: Option<PathBuf>,
    /// Parsed two-turn template; always has exactly the `question` slot.
    pub prompt: ChatPromptTemplate,
    pub llm: LlmConfig,
    pub ui: UiConfig,
    /// API key from the environment; `None` when unset or blank.
    pub llm_api_key: Option<String>,
}

/// Values taken from the process environment rather than the TOML file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub bind: Option<String>,
    pub api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("ASKBOT_LOG_LEVEL").ok(),
            bind: env::var("ASKBOT_BIND").ok(),
            api_key: pick_api_key(env::var("GOOGLE_API_KEY").ok(), env::var("LLM_API_KEY").ok()),
        }
    }
}

/// First non-blank key wins, so an empty `GOOGLE_API_KEY=` line in `.env`
/// does not hide `LLM_API_KEY`.
fn pick_api_key(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    let usable = |k: &String| !k.trim().is_empty();
    primary.filter(usable).or_else(|| fallback.filter(usable))
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    prompt: RawPrompt,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    ui: RawUi,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_input_label")]
    input_label: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            title: default_title(),
            input_label: default_input_label(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

#[derive(Deserialize)]
struct RawPrompt {
    #[serde(default = "default_system")]
    system: String,
    #[serde(default = "default_human")]
    human: String,
}

impl Default for RawPrompt {
    fn default() -> Self {
        Self { system: default_system(), human: default_human() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    ping_on_start: bool,
    #[serde(default)]
    gemini: RawModel,
    #[serde(default)]
    openai: RawModel,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            ping_on_start: false,
            gemini: RawModel::default(),
            openai: RawModel::default(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawModel {
    api_base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    /// `0` or absent means no timeout.
    timeout_seconds: Option<u64>,
    max_retries: Option<u32>,
}

impl RawModel {
    fn resolve(self, defaults: ModelConfig) -> ModelConfig {
        ModelConfig {
            api_base_url: self.api_base_url.unwrap_or(defaults.api_base_url),
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            timeout_seconds: self
                .timeout_seconds
                .or(defaults.timeout_seconds)
                .filter(|&s| s > 0),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
        }
    }
}

#[derive(Deserialize)]
struct RawUi {
    #[serde(default = "default_channel")]
    channel: ChannelKind,
    #[serde(default = "default_bind")]
    bind: String,
}

impl Default for RawUi {
    fn default() -> Self {
        Self { channel: default_channel(), bind: default_bind() }
    }
}

fn default_title() -> String { "This is a chatbot".to_string() }
fn default_input_label() -> String { "enter your question here".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_system() -> String { prompt::DEFAULT_SYSTEM.to_string() }
fn default_human() -> String { prompt::DEFAULT_HUMAN.to_string() }
fn default_llm_provider() -> String { "gemini".to_string() }
fn default_channel() -> ChannelKind { ChannelKind::Web }
fn default_bind() -> String { "127.0.0.1:8501".to_string() }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `ASKBOT_CONFIG` or `config/default.toml`, then apply
/// env-var overrides.
///
/// An explicit `ASKBOT_CONFIG` path must exist; a missing default file means
/// "use built-in defaults".
pub fn load() -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();
    match env::var("ASKBOT_CONFIG") {
        Ok(path) => load_from(&expand_home(&path), &overrides),
        Err(_) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                load_from(path, &overrides)
            } else {
                parse("", &overrides)
            }
        }
    }
}

/// Load from an explicit path. Tests pass overrides directly instead of
/// mutating env vars.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw, overrides)
        .map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
}

/// Parse and validate TOML text.
pub fn parse(text: &str, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let parsed: RawConfig =
        toml::from_str(text).map_err(|e| AppError::Config(format!("parse error: {e}")))?;

    let template = ChatPromptTemplate::from_messages([
        (Role::System, parsed.prompt.system.as_str()),
        (Role::User, parsed.prompt.human.as_str()),
    ])
    .map_err(|e| AppError::Config(format!("[prompt]: {e}")))?;
    if template.input_variables() != [prompt::QUESTION_VAR] {
        return Err(AppError::Config(format!(
            "[prompt] must use exactly the {{{{{}}}}} slot, found {:?}",
            prompt::QUESTION_VAR,
            template.input_variables()
        )));
    }

    let llm = LlmConfig {
        provider: parsed.llm.provider,
        ping_on_start: parsed.llm.ping_on_start,
        gemini: parsed.llm.gemini.resolve(ModelConfig::default()),
        openai: parsed.llm.openai.resolve(ModelConfig::openai_default()),
    };
    for (section, model) in [("gemini", &llm.gemini), ("openai", &llm.openai)] {
        if !(0.0..=2.0).contains(&model.temperature) {
            return Err(AppError::Config(format!(
                "[llm.{section}] temperature must be within 0.0..=2.0, got {}",
                model.temperature
            )));
        }
        if model.model.trim().is_empty() {
            return Err(AppError::Config(format!("[llm.{section}] model must not be empty")));
        }
    }

    Ok(Config {
        title: parsed.app.title,
        input_label: parsed.app.input_label,
        log_level: overrides.log_level.clone().unwrap_or(parsed.app.log_level),
        log_file: parsed.app.log_file.as_deref().map(expand_home),
        prompt: template,
        llm,
        ui: UiConfig {
            channel: parsed.ui.channel,
            bind: overrides.bind.clone().unwrap_or(parsed.ui.bind),
        },
        llm_api_key: overrides
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty()),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
